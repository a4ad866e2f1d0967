//! Keyed blob store: list/get/put/delete over project artifact keys
//! (spec.md §4.2). Two implementations share one trait so `projectsync` and
//! its tests never depend on a concrete backend: a plain local-filesystem
//! store for tests/dev, and an `object_store`-crate-backed store (the
//! Apache Arrow project's generic S3/GCS/Azure/local abstraction) for
//! production.

mod local;
mod remote;

pub use local::LocalFsStore;
pub use remote::ObjectStoreBackedStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObjectStoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("io: {0}")]
    Io(String),
    #[error("backend: {0}")]
    Backend(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobMeta {
    pub key: String,
    pub size: u64,
}

/// A directory-marker key (trailing `/`) carries no content and is skipped
/// by callers that materialise files (spec.md §4.2).
pub fn is_directory_marker(key: &str) -> bool {
    key.ends_with('/')
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, ObjectStoreError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
}
