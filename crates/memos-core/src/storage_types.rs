use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend selected by the `storage-service-id` system setting.
///
/// `0` keeps bytes inline in the database, `-1` writes them under the data
/// root, and any positive value names a remote storage record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(into = "i32", try_from = "i32")]
pub enum StorageBackend {
    #[default]
    Database,
    Local,
    Remote(i32),
}

pub const DATABASE_STORAGE_ID: i32 = 0;
pub const LOCAL_STORAGE_ID: i32 = -1;

impl StorageBackend {
    pub fn from_id(id: i32) -> Result<Self, anyhow::Error> {
        match id {
            DATABASE_STORAGE_ID => Ok(StorageBackend::Database),
            LOCAL_STORAGE_ID => Ok(StorageBackend::Local),
            id if id > 0 => Ok(StorageBackend::Remote(id)),
            _ => Err(anyhow::anyhow!("Invalid storage service id: {}", id)),
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            StorageBackend::Database => DATABASE_STORAGE_ID,
            StorageBackend::Local => LOCAL_STORAGE_ID,
            StorageBackend::Remote(id) => *id,
        }
    }
}

impl From<StorageBackend> for i32 {
    fn from(backend: StorageBackend) -> Self {
        backend.id()
    }
}

impl TryFrom<i32> for StorageBackend {
    type Error = anyhow::Error;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        StorageBackend::from_id(id)
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: i32 = s
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid storage service id: {}", s))?;
        StorageBackend::from_id(id)
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Database => write!(f, "database"),
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::Remote(id) => write!(f, "remote:{}", id),
        }
    }
}
