//! Local-filesystem-backed `BlobStore`, used in tests and single-node
//! deployments where a networked object store is overkill.

use crate::{BlobMeta, BlobStore, ObjectStoreError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

fn walk(dir: &Path, prefix_root: &Path, out: &mut Vec<BlobMeta>) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, prefix_root, out)?;
        } else {
            let rel = path
                .strip_prefix(prefix_root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            let size = entry.metadata()?.len();
            out.push(BlobMeta { key: rel, size });
        }
    }
    Ok(())
}

#[async_trait]
impl BlobStore for LocalFsStore {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, ObjectStoreError> {
        let root = self.root.clone();
        let dir = self.path_for(prefix);
        tokio::task::spawn_blocking(move || {
            let mut out = Vec::new();
            walk(&dir, &root, &mut out).map_err(|e| ObjectStoreError::Io(e.to_string()))?;
            Ok(out)
        })
        .await
        .map_err(|e| ObjectStoreError::Backend(e.to_string()))?
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let path = self.path_for(key);
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ObjectStoreError::NotFound(key.to_string())
            } else {
                ObjectStoreError::Io(e.to_string())
            }
        })
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), ObjectStoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
        }
        tokio::fs::write(&path, data).await.map_err(|e| ObjectStoreError::Io(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ObjectStoreError::Io(e.to_string())),
        }
    }
}
