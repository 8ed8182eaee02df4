//! Storage configuration models: which backend is active and how it is addressed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

pub const DEFAULT_LOCAL_PATH_TEMPLATE: &str = "assets/{filename}";
pub const DEFAULT_MAX_UPLOAD_SIZE_MIB: i64 = 32;

/// Snapshot of the storage settings, read once per operation.
#[derive(Debug, Clone, Default)]
pub struct StorageConfiguration {
    pub backend: StorageBackend,
    /// Template for local-filesystem paths; empty means the default.
    pub local_path_template: String,
    /// Remote storage record resolved for `StorageBackend::Remote(id)`.
    pub remote: Option<RemoteStorage>,
}

impl StorageConfiguration {
    pub fn local_path_template(&self) -> &str {
        if self.local_path_template.trim().is_empty() {
            DEFAULT_LOCAL_PATH_TEMPLATE
        } else {
            &self.local_path_template
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteStorageKind {
    #[serde(rename = "S3")]
    S3,
}

impl FromStr for RemoteStorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S3" => Ok(RemoteStorageKind::S3),
            other => Err(anyhow::anyhow!("Unsupported storage type: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteStorage {
    pub id: i32,
    pub name: String,
    pub kind: RemoteStorageKind,
    pub config: S3Config,
}

/// Remote storage settings as persisted in the `storage.config` column.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct S3Config {
    pub end_point: String,
    /// Key template; same placeholders as the local path template.
    pub path: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub url_prefix: String,
    pub url_suffix: String,
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("end_point", &self.end_point)
            .field("path", &self.path)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("url_prefix", &self.url_prefix)
            .field("url_suffix", &self.url_suffix)
            .finish()
    }
}

/// Wrapper matching the persisted `{ "s3Config": { ... } }` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfigDocument {
    #[serde(default)]
    pub s3_config: Option<S3Config>,
}
