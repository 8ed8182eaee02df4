//! Blob storage abstraction
//!
//! Every backend accepts a resource draft plus a byte stream and reports where
//! the bytes now live. Which backend handles a given upload is decided per
//! operation by the factory, from the current storage configuration.

use async_trait::async_trait;
use memos_core::models::{ResourceCreate, ResourceLocation};
use memos_core::{AppError, StorageBackend};
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::WriteFailed(msg) => AppError::Io(msg),
            StorageError::IoError(e) => AppError::Io(e.to_string()),
            StorageError::UploadFailed(msg) => AppError::RemoteStorage(msg),
            StorageError::InvalidKey(msg) => AppError::Validation(msg),
            StorageError::ConfigError(msg) => AppError::Configuration(msg),
        }
    }
}

/// Outcome of a successful store: the single populated location and the byte count written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub location: ResourceLocation,
    pub size: u64,
}

/// Byte source handed to a backend.
pub type BlobReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Drain `reader` into this backend.
    ///
    /// On error nothing is registered: local backends remove any partial file
    /// before returning.
    async fn store(&self, draft: &ResourceCreate, reader: BlobReader) -> StorageResult<StoredBlob>;

    /// Get the storage backend type
    fn backend(&self) -> StorageBackend;
}
