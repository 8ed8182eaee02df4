use crate::path_template;
use crate::traits::{BlobReader, BlobStore, StorageError, StorageResult, StoredBlob};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use memos_core::models::{ResourceCreate, ResourceLocation, S3Config};
use memos_core::StorageBackend;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use tokio::io::AsyncReadExt;

/// S3-compatible object storage addressed by one remote storage record.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    storage_id: i32,
    store: AmazonS3,
    config: S3Config,
}

impl S3BlobStore {
    /// Build a client from a remote storage record.
    ///
    /// Credentials come from the record only, never from the process environment.
    pub fn new(storage_id: i32, config: S3Config) -> StorageResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::ConfigError(format!(
                "Storage {} has no bucket configured",
                storage_id
            )));
        }

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(config.bucket.clone())
            .with_access_key_id(config.access_key.clone())
            .with_secret_access_key(config.secret_key.clone());

        if !config.region.is_empty() {
            builder = builder.with_region(config.region.clone());
        }

        if !config.end_point.is_empty() {
            let allow_http = config.end_point.starts_with("http://");
            builder = builder
                .with_endpoint(config.end_point.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3BlobStore {
            storage_id,
            store,
            config,
        })
    }

    /// Object key for an upload: the record's path template with a trailing `{filename}`.
    fn generate_key(&self, filename: &str) -> String {
        let template = path_template::ensure_filename_segment(&self.config.path);
        path_template::resolve(&template, filename, Utc::now())
            .trim_start_matches('/')
            .to_string()
    }

    /// Generate public URL for an object
    ///
    /// A configured URL prefix wins. Otherwise S3-compatible providers get a
    /// path-style `{endpoint}/{bucket}/{key}` URL and AWS the virtual-hosted one.
    fn generate_url(&self, key: &str) -> String {
        let base = if !self.config.url_prefix.is_empty() {
            format!("{}/{}", self.config.url_prefix.trim_end_matches('/'), key)
        } else if !self.config.end_point.is_empty() {
            format!(
                "{}/{}/{}",
                self.config.end_point.trim_end_matches('/'),
                self.config.bucket,
                key
            )
        } else {
            let region = if self.config.region.is_empty() {
                "us-east-1"
            } else {
                &self.config.region
            };
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket, region, key
            )
        };
        format!("{}{}", base, self.config.url_suffix)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn store(
        &self,
        draft: &ResourceCreate,
        mut reader: BlobReader,
    ) -> StorageResult<StoredBlob> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await?;

        let key = self.generate_key(&draft.filename);
        let size = buffer.len() as u64;
        let location = Path::from(key.clone());

        let mut attributes = Attributes::new();
        if !draft.content_type.is_empty() {
            attributes.insert(Attribute::ContentType, draft.content_type.clone().into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let start = std::time::Instant::now();

        self.store
            .put_opts(&location, PutPayload::from(Bytes::from(buffer)), options)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    storage_id = self.storage_id,
                    bucket = %self.config.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let url = self.generate_url(&key);

        tracing::info!(
            storage_id = self.storage_id,
            bucket = %self.config.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(StoredBlob {
            location: ResourceLocation::External(url),
            size,
        })
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Remote(self.storage_id)
    }
}
