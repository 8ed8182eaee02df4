use crate::path_template;
use crate::traits::{BlobReader, BlobStore, StorageError, StorageResult, StoredBlob};
use async_trait::async_trait;
use chrono::Utc;
use memos_core::models::{ResourceCreate, ResourceLocation};
use memos_core::StorageBackend;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage under the data root.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    data_dir: PathBuf,
    template: String,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore
    ///
    /// # Arguments
    /// * `data_dir` - Data root; resolved paths are joined beneath it
    /// * `template` - Path template such as `assets/{year}/{filename}`
    pub fn new(data_dir: impl Into<PathBuf>, template: impl Into<String>) -> StorageResult<Self> {
        let data_dir = std::path::absolute(data_dir.into()).map_err(|e| {
            StorageError::ConfigError(format!("Failed to resolve data directory: {}", e))
        })?;

        Ok(LocalBlobStore {
            data_dir,
            template: path_template::ensure_filename_segment(&template.into()),
        })
    }

    /// Convert a resolved template into a path under the data root.
    ///
    /// A leading root (`/uploads/...`) is joined under the data root like any
    /// relative path. `..` components are rejected.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        let mut path = self.data_dir.clone();
        for component in Path::new(key).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    return Err(StorageError::InvalidKey(format!(
                        "Storage path {} resolves outside the data directory",
                        key
                    )));
                }
            }
        }

        Ok(path)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    async fn write(&self, path: &Path, mut reader: BlobReader) -> StorageResult<u64> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let size = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.flush().await?;
        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(size)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, draft: &ResourceCreate, reader: BlobReader) -> StorageResult<StoredBlob> {
        let key = path_template::resolve(&self.template, &draft.filename, Utc::now());
        let path = self.key_to_path(&key)?;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let size = match self.write(&path, reader).await {
            Ok(size) => size,
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&path).await {
                    tracing::warn!(
                        error = %remove_err,
                        path = %path.display(),
                        "Failed to remove partially written file"
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(StoredBlob {
            location: ResourceLocation::Local(path.to_string_lossy().into_owned()),
            size,
        })
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
