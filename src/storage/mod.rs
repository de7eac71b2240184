//! Blob Storage Module
//!
//! External byte-blob persistence used by the file and image stores.
//! Location keys are opaque to the stores; backends decide what they mean.

mod fs;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

// == Blob Error ==
/// Failure reported by a blob backend.
#[derive(Error, Debug)]
pub enum BlobError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No blob stored under the key
    #[error("Blob missing: {0}")]
    Missing(String),

    /// Key cannot be mapped onto the backend
    #[error("Invalid location key: {0}")]
    InvalidKey(String),

    /// Operation exceeded the configured deadline
    #[error("Operation timed out")]
    TimedOut,

    /// Operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,
}

// == Blob Store Trait ==
/// Key/value byte-blob storage.
///
/// `delete` must succeed when the key is already absent so that a retried
/// removal converges after a partial failure.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `bytes` under `key`, replacing any previous blob.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobError>;

    /// Reads the blob stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError>;

    /// Deletes the blob stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}
