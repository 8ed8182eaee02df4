use crate::traits::{BlobReader, BlobStore, StorageResult, StoredBlob};
use async_trait::async_trait;
use memos_core::models::{ResourceCreate, ResourceLocation};
use memos_core::StorageBackend;
use tokio::io::AsyncReadExt;

/// Keeps resource bytes inline in the resource record.
///
/// The whole stream is buffered; callers cap the size upstream.
#[derive(Debug, Clone, Default)]
pub struct DatabaseBlobStore;

impl DatabaseBlobStore {
    pub fn new() -> Self {
        DatabaseBlobStore
    }
}

#[async_trait]
impl BlobStore for DatabaseBlobStore {
    async fn store(
        &self,
        draft: &ResourceCreate,
        mut reader: BlobReader,
    ) -> StorageResult<StoredBlob> {
        let mut blob = Vec::new();
        reader.read_to_end(&mut blob).await?;

        tracing::debug!(
            filename = %draft.filename,
            size_bytes = blob.len(),
            "Buffered resource blob for inline storage"
        );

        let size = blob.len() as u64;
        Ok(StoredBlob {
            location: ResourceLocation::Inline(blob),
            size,
        })
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Database
    }
}
