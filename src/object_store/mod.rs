mod local;

pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Object key escapes the storage root: {0}")]
    InvalidKey(String),
}

/// Streaming handle to stored bytes.
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Abstraction over the upload directory.
/// Keys are UUIDs -- the raw blobs are meaningless without the metadata DB.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError>;
    /// Open the object for streaming; `NotFound` when absent.
    async fn open(&self, key: &str) -> Result<ObjectReader, ObjectStoreError>;
    async fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
}
