//! Persistence contracts consumed by the resource lifecycle.
//!
//! Each trait is implemented by a PostgreSQL repository in `db` and by the
//! in-memory store in `test_helpers`.

use async_trait::async_trait;
use memos_core::models::{
    ActivityCreate, FindResource, MemoResource, RemoteStorage, Resource, ResourceCreate,
    StorageConfiguration, UpdateResource, Visibility,
};
use memos_core::{AppError, StorageBackend};

pub const SETTING_STORAGE_SERVICE_ID: &str = "storage-service-id";
pub const SETTING_LOCAL_STORAGE_PATH: &str = "local-storage-path";
pub const SETTING_MAX_UPLOAD_SIZE_MIB: &str = "max-upload-size-mib";

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Register a resource whose bytes are already stored. Timestamps are assigned here.
    async fn create_resource(&self, create: ResourceCreate) -> Result<Resource, AppError>;

    /// First resource matching `find`, if any.
    async fn get_resource(&self, find: &FindResource) -> Result<Option<Resource>, AppError>;

    /// Resources matching `find`, newest first.
    async fn list_resources(&self, find: &FindResource) -> Result<Vec<Resource>, AppError>;

    async fn update_resource(&self, update: &UpdateResource) -> Result<Resource, AppError>;

    async fn delete_resource(&self, id: i32) -> Result<(), AppError>;
}

#[async_trait]
pub trait MemoResourceRepository: Send + Sync {
    async fn list_memo_resources(&self, resource_id: i32) -> Result<Vec<MemoResource>, AppError>;

    async fn get_memo_visibilities(&self, memo_ids: &[i32]) -> Result<Vec<Visibility>, AppError>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn create_activity(&self, activity: ActivityCreate) -> Result<(), AppError>;
}

#[async_trait]
pub trait SystemSettingRepository: Send + Sync {
    /// Raw stored value of a system setting.
    async fn get_system_setting(&self, name: &str) -> Result<Option<String>, AppError>;

    /// Remote storage record by id. Unsupported storage types are a configuration error.
    async fn get_remote_storage(&self, id: i32) -> Result<Option<RemoteStorage>, AppError>;

    /// Current storage configuration. Not cached: every call reads the settings again.
    async fn get_storage_configuration(&self) -> Result<StorageConfiguration, AppError> {
        let backend = match self.get_system_setting(SETTING_STORAGE_SERVICE_ID).await? {
            Some(value) if !value.trim().is_empty() => {
                let id: i32 = serde_json::from_str(value.trim()).map_err(|e| {
                    AppError::Configuration(format!("Failed to parse storage service id: {}", e))
                })?;
                StorageBackend::from_id(id).map_err(|e| AppError::Configuration(e.to_string()))?
            }
            _ => StorageBackend::Database,
        };

        let mut config = StorageConfiguration {
            backend,
            ..Default::default()
        };

        match backend {
            StorageBackend::Database => {}
            StorageBackend::Local => {
                if let Some(value) = self.get_system_setting(SETTING_LOCAL_STORAGE_PATH).await? {
                    if !value.is_empty() {
                        config.local_path_template =
                            serde_json::from_str(&value).map_err(|e| {
                                AppError::Configuration(format!(
                                    "Failed to parse local storage path: {}",
                                    e
                                ))
                            })?;
                    }
                }
            }
            StorageBackend::Remote(id) => {
                config.remote = self.get_remote_storage(id).await?;
            }
        }

        Ok(config)
    }

    /// Raw `max-upload-size-mib` setting; interpretation is left to the caller.
    async fn get_upload_size_limit_setting(&self) -> Result<Option<String>, AppError> {
        self.get_system_setting(SETTING_MAX_UPLOAD_SIZE_MIB).await
    }
}
