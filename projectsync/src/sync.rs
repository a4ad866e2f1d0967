use objectstore::{is_directory_marker, BlobStore, ObjectStoreError};
use std::path::Path;
use thiserror::Error;

const MAX_FILES_PER_SYNC: usize = 10_000;
const MAX_BYTES_PER_SYNC: u64 = 10 * 1024 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("sync would materialise {0} files, over the {MAX_FILES_PER_SYNC} limit")]
    TooManyFiles(usize),
    #[error("sync would transfer {0} bytes, over the {MAX_BYTES_PER_SYNC} limit")]
    TooManyBytes(u64),
    #[error("no object in the {0} prefix could be downloaded")]
    NoObjectsSucceeded(String),
    #[error("local filesystem error: {0}")]
    Io(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub files_synced: usize,
    pub bytes_synced: u64,
    pub files_skipped: usize,
}

/// Lists everything under `{project_id}/`, skips directory markers, and
/// writes the rest to `{local_base}/{project_id}/{relative}`. Additive and
/// best-effort per object; a download failure is logged and skipped rather
/// than aborting the whole sync (spec.md §4.2).
pub async fn sync_project(
    store: &dyn BlobStore,
    project_id: &str,
    local_base: &Path,
) -> Result<SyncReport, SyncError> {
    let prefix = format!("{project_id}/");
    let all_blobs = store
        .list(&prefix)
        .await
        .map_err(|e| SyncError::Io(e.to_string()))?;
    let blobs: Vec<_> = all_blobs
        .into_iter()
        .filter(|b| !is_directory_marker(&b.key))
        .collect();

    if blobs.len() > MAX_FILES_PER_SYNC {
        return Err(SyncError::TooManyFiles(blobs.len()));
    }
    let prospective_bytes: u64 = blobs.iter().map(|b| b.size).sum();
    if prospective_bytes > MAX_BYTES_PER_SYNC {
        return Err(SyncError::TooManyBytes(prospective_bytes));
    }

    let project_root = local_base.join(project_id);
    let mut report = SyncReport::default();

    for blob in &blobs {
        let relative = blob.key.strip_prefix(&prefix).unwrap_or(&blob.key);
        let dest = project_root.join(relative);
        match materialize_one(store, &blob.key, &dest).await {
            Ok(bytes) => {
                report.files_synced += 1;
                report.bytes_synced += bytes;
            }
            Err(e) => {
                tracing::warn!(key = %blob.key, error = %e, "skipping object that failed to sync");
                report.files_skipped += 1;
            }
        }
    }

    if blobs.is_empty() || report.files_synced > 0 {
        Ok(report)
    } else {
        Err(SyncError::NoObjectsSucceeded(prefix))
    }
}

async fn materialize_one(
    store: &dyn BlobStore,
    key: &str,
    dest: &Path,
) -> Result<u64, ObjectStoreError> {
    let data = store.get(key).await?;
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
    }
    tokio::fs::write(dest, &data)
        .await
        .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
    Ok(data.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use objectstore::LocalFsStore;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_prefix_syncs_successfully_with_zero_files() {
        let source_dir = tempdir().unwrap();
        let dest_dir = tempdir().unwrap();
        let store = LocalFsStore::new(source_dir.path());
        let report = sync_project(&store, "proj-1", dest_dir.path()).await.unwrap();
        assert_eq!(report.files_synced, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn materialises_nested_files_under_local_base() {
        let source_dir = tempdir().unwrap();
        let dest_dir = tempdir().unwrap();
        let store = LocalFsStore::new(source_dir.path());
        store.put("proj-1/reports/q3.csv", b"a,b,c".to_vec()).await.unwrap();

        let report = sync_project(&store, "proj-1", dest_dir.path()).await.unwrap();
        assert_eq!(report.files_synced, 1);
        let written = tokio::fs::read(dest_dir.path().join("proj-1/reports/q3.csv"))
            .await
            .unwrap();
        assert_eq!(written, b"a,b,c");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn does_not_remove_files_deleted_from_the_store() {
        let source_dir = tempdir().unwrap();
        let dest_dir = tempdir().unwrap();
        let store = LocalFsStore::new(source_dir.path());
        store.put("proj-1/a.txt", b"one".to_vec()).await.unwrap();
        sync_project(&store, "proj-1", dest_dir.path()).await.unwrap();
        store.delete("proj-1/a.txt").await.unwrap();
        sync_project(&store, "proj-1", dest_dir.path()).await.unwrap();

        let still_there = tokio::fs::read(dest_dir.path().join("proj-1/a.txt")).await.unwrap();
        assert_eq!(still_there, b"one");
    }
}
