//! `object_store`-crate-backed `BlobStore`: any backend the `object_store`
//! crate supports (S3, GCS, Azure, or its own local-filesystem impl) behind
//! the same trait `projectsync` depends on.

use crate::{BlobMeta, BlobStore, ObjectStoreError};
use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore as ObjectStoreBackend;
use std::sync::Arc;

pub struct ObjectStoreBackedStore {
    backend: Arc<dyn ObjectStoreBackend>,
}

impl ObjectStoreBackedStore {
    pub fn new(backend: Arc<dyn ObjectStoreBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBackedStore {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, ObjectStoreError> {
        let prefix = ObjectPath::from(prefix);
        let entries = self
            .backend
            .list(Some(&prefix))
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;
        Ok(entries
            .into_iter()
            .map(|m| BlobMeta {
                key: m.location.to_string(),
                size: m.size as u64,
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let path = ObjectPath::from(key);
        let result = self.backend.get(&path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => ObjectStoreError::NotFound(key.to_string()),
            other => ObjectStoreError::Backend(other.to_string()),
        })?;
        let bytes = result.bytes().await.map_err(|e| ObjectStoreError::Backend(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), ObjectStoreError> {
        let path = ObjectPath::from(key);
        self.backend
            .put(&path, data.into())
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = ObjectPath::from(key);
        match self.backend.delete(&path).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(ObjectStoreError::Backend(e.to_string())),
        }
    }
}
