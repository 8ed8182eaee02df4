//! Memos Storage Library
//!
//! Path templating and the blob storage backends a resource's bytes can land
//! in: inline in the database row, a file under the data root, or an object in
//! S3-compatible storage.
//!
//! # Path templates
//!
//! Local paths and object keys come from a template such as
//! `assets/{year}/{month}/{filename}`. Templates without `{filename}` get one
//! appended. Local keys must not contain `..` or a leading `/`.

pub mod database;
pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod path_template;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use database::DatabaseBlobStore;
pub use factory::create_blob_store;
#[cfg(feature = "storage-local")]
pub use local::LocalBlobStore;
pub use memos_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3BlobStore;
pub use traits::{BlobReader, BlobStore, StorageError, StorageResult, StoredBlob};
