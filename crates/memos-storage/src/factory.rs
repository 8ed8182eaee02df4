use crate::database::DatabaseBlobStore;
#[cfg(feature = "storage-local")]
use crate::local::LocalBlobStore;
#[cfg(feature = "storage-s3")]
use crate::s3::S3BlobStore;
use crate::{BlobStore, StorageBackend, StorageError, StorageResult};
use memos_core::models::{RemoteStorageKind, StorageConfiguration};
use std::path::Path;
use std::sync::Arc;

/// Create the blob store selected by the current storage configuration.
///
/// Called once per operation so that settings changes apply to the next upload.
pub fn create_blob_store(
    config: &StorageConfiguration,
    data_dir: &Path,
) -> StorageResult<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Database => Ok(Arc::new(DatabaseBlobStore::new())),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let store = LocalBlobStore::new(data_dir, config.local_path_template())?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => {
            let _ = data_dir;
            Err(StorageError::ConfigError(
                "Local storage backend not available (storage-local feature not enabled)"
                    .to_string(),
            ))
        }

        StorageBackend::Remote(id) => {
            let remote = config
                .remote
                .as_ref()
                .filter(|remote| remote.id == id)
                .ok_or_else(|| StorageError::ConfigError(format!("Storage {} not found", id)))?;

            match remote.kind {
                #[cfg(feature = "storage-s3")]
                RemoteStorageKind::S3 => {
                    let store = S3BlobStore::new(remote.id, remote.config.clone())?;
                    Ok(Arc::new(store))
                }

                #[cfg(not(feature = "storage-s3"))]
                RemoteStorageKind::S3 => Err(StorageError::ConfigError(
                    "S3 storage backend not available (storage-s3 feature not enabled)"
                        .to_string(),
                )),
            }
        }
    }
}
