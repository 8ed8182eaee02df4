//! Resource lifecycle: create, list, serve, rename and delete.
//!
//! Keeps handler logic thin and allows unit testing without HTTP. The storage
//! backend is resolved from the system settings on every write, so a settings
//! change applies to the next upload without a restart.
//!
//! Bytes are written before the record is registered. If registration then
//! fails the bytes stay behind with no record pointing at them.

use crate::services::external_fetch::{parse_external_link, ExternalFetcher};
use crate::services::visibility::VisibilityResolver;
use crate::utils::mime::normalize_mime_type;
use crate::utils::upload::{upload_limit_bytes, validate_file_size, UploadedFile};
use bytes::Bytes;
use memos_core::models::{
    ActivityCreate, CreateResourceRequest, FindResource, ListResourcesQuery, Resource,
    ResourceCreate, ResourceLocation, UpdateResource, UpdateResourceRequest, Visibility,
};
use memos_core::AppError;
use memos_db::{
    ActivityRepository, MemoResourceRepository, ResourceRepository, SystemSettingRepository,
};
use memos_processing::{is_thumbnail_supported, ThumbnailCache, ThumbnailKey};
use memos_storage::{create_blob_store, BlobReader};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Bytes of a resource ready to be sent.
#[derive(Debug)]
pub enum ResourceContent {
    Bytes(Bytes),
    /// Local file, streamed rather than buffered.
    File { file: tokio::fs::File, len: u64 },
}

impl ResourceContent {
    pub fn len(&self) -> u64 {
        match self {
            ResourceContent::Bytes(bytes) => bytes.len() as u64,
            ResourceContent::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn into_bytes(self) -> Result<Bytes, AppError> {
        match self {
            ResourceContent::Bytes(bytes) => Ok(bytes),
            ResourceContent::File { mut file, len } => {
                let mut buf = Vec::with_capacity(len as usize);
                file.read_to_end(&mut buf).await.map_err(|e| {
                    AppError::Io(format!("Failed to read the local resource: {}", e))
                })?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

/// A resource the caller may read, with its bytes.
#[derive(Debug)]
pub struct ServedResource {
    pub resource: Resource,
    pub content: ResourceContent,
}

/// Persistence collaborators of the lifecycle.
#[derive(Clone)]
pub struct ResourceRepositories {
    pub resources: Arc<dyn ResourceRepository>,
    pub memo_resources: Arc<dyn MemoResourceRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub settings: Arc<dyn SystemSettingRepository>,
}

#[derive(Clone)]
pub struct ResourceService {
    resources: Arc<dyn ResourceRepository>,
    activities: Arc<dyn ActivityRepository>,
    settings: Arc<dyn SystemSettingRepository>,
    visibility: VisibilityResolver,
    thumbnails: ThumbnailCache,
    fetcher: ExternalFetcher,
    data_dir: PathBuf,
}

impl ResourceService {
    pub fn new(
        repositories: ResourceRepositories,
        thumbnails: ThumbnailCache,
        fetcher: ExternalFetcher,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resources: repositories.resources,
            activities: repositories.activities,
            settings: repositories.settings,
            visibility: VisibilityResolver::new(repositories.memo_resources),
            thumbnails,
            fetcher,
            data_dir: data_dir.into(),
        }
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    /// Current upload limit in bytes, read from the settings on every call.
    pub async fn upload_size_limit(&self) -> Result<u64, AppError> {
        let setting = self.settings.get_upload_size_limit_setting().await?;
        Ok(upload_limit_bytes(setting.as_deref()))
    }

    #[tracing::instrument(
        skip(self, upload),
        fields(filename = %upload.filename, size_bytes = upload.data.len())
    )]
    pub async fn create_from_upload(
        &self,
        creator_id: i32,
        upload: UploadedFile,
        limit: u64,
    ) -> Result<Resource, AppError> {
        validate_file_size(upload.data.len() as u64, limit)?;

        let draft = ResourceCreate {
            creator_id,
            filename: upload.filename,
            content_type: upload.content_type,
            size: upload.data.len() as i64,
            location: None,
        };
        self.store_and_register(draft, upload.data).await
    }

    /// Create from JSON: a bare record, a kept external link, or a downloaded copy.
    #[tracing::instrument(skip(self, request), fields(download = request.download_to_local))]
    pub async fn create_from_request(
        &self,
        creator_id: i32,
        request: CreateResourceRequest,
    ) -> Result<Resource, AppError> {
        let mut draft = ResourceCreate {
            creator_id,
            filename: request.filename,
            content_type: request.content_type,
            ..Default::default()
        };

        let link = request.external_link.trim();
        if link.is_empty() {
            return self.register(draft).await;
        }

        let url = parse_external_link(link)?;
        if !request.download_to_local {
            draft.location = Some(ResourceLocation::External(link.to_string()));
            return self.register(draft).await;
        }

        let limit = self.upload_size_limit().await?;
        let fetched = self.fetcher.fetch(&url, limit).await?;

        draft.filename = fetched.filename;
        draft.content_type = fetched.content_type;
        draft.size = fetched.data.len() as i64;
        self.store_and_register(draft, fetched.data).await
    }

    async fn store_and_register(
        &self,
        mut draft: ResourceCreate,
        data: Bytes,
    ) -> Result<Resource, AppError> {
        let config = self.settings.get_storage_configuration().await?;
        let store = create_blob_store(&config, &self.data_dir)?;

        let reader: BlobReader = Box::pin(Cursor::new(data));
        let stored = store.store(&draft, reader).await?;

        tracing::debug!(
            backend = %store.backend(),
            size_bytes = stored.size,
            "Resource bytes stored"
        );

        draft.size = stored.size as i64;
        draft.location = Some(stored.location);
        self.register(draft).await
    }

    /// Persist the record, then the creation activity. An activity failure is
    /// reported even though the record already exists.
    async fn register(&self, draft: ResourceCreate) -> Result<Resource, AppError> {
        let activity = ActivityCreate::resource_created(draft.creator_id, &draft);
        let resource = self.resources.create_resource(draft).await?;

        self.activities.create_activity(activity).await.map_err(|e| {
            tracing::error!(resource_id = resource.id, error = %e, "Failed to create activity");
            e
        })?;

        tracing::info!(
            resource_id = resource.id,
            creator_id = resource.creator_id,
            size_bytes = resource.size,
            "Resource created"
        );
        Ok(resource)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        creator_id: i32,
        query: ListResourcesQuery,
    ) -> Result<Vec<Resource>, AppError> {
        let find = FindResource {
            creator_id: Some(creator_id),
            limit: query.limit,
            offset: query.offset,
            ..Default::default()
        };
        self.resources.list_resources(&find).await
    }

    /// Rename. Only the creator may patch; an empty filename only bumps the timestamp.
    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        creator_id: i32,
        id: i32,
        request: UpdateResourceRequest,
    ) -> Result<Resource, AppError> {
        let resource = self
            .resources
            .get_resource(&FindResource::by_id(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resource not found: {}", id)))?;

        if resource.creator_id != creator_id {
            return Err(AppError::Unauthorized("Unauthorized".to_string()));
        }

        let update = UpdateResource {
            id,
            filename: request.filename.filter(|name| !name.is_empty()),
            updated_ts: chrono::Utc::now().timestamp(),
        };
        self.resources.update_resource(&update).await
    }

    /// Delete the caller's resource. Local file and thumbnail removal is best
    /// effort and never blocks removal of the record. Remote objects are kept.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, creator_id: i32, id: i32) -> Result<(), AppError> {
        let resource = self
            .resources
            .get_resource(&FindResource::by_id(id).with_creator(creator_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resource not found: {}", id)))?;

        if let Some(path) = resource.location.as_ref().and_then(|l| l.internal_path()) {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!(path = %path, error = %e, "Failed to delete local file");
            }
        }

        let key = ThumbnailKey::new(resource.id, resource.extension());
        if let Err(e) = self.thumbnails.remove(&key).await {
            let path = self.thumbnails.path_for(&key);
            if e.kind() == std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), "No thumbnail to delete");
            } else {
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete local thumbnail");
            }
        }

        self.resources.delete_resource(id).await?;
        tracing::info!(resource_id = id, "Resource deleted");
        Ok(())
    }

    /// Load a resource for public delivery, enforcing its effective visibility.
    ///
    /// Protected needs any signed-in caller, Private needs the creator. Thumbnail
    /// failures (no permit, undecodable image) fall back to the original bytes.
    #[tracing::instrument(skip(self))]
    pub async fn serve(
        &self,
        requester: Option<i32>,
        id: i32,
        thumbnail: bool,
    ) -> Result<ServedResource, AppError> {
        let visibility = self.visibility.resolve(id).await?;
        if visibility == Visibility::Protected && requester.is_none() {
            return Err(AppError::Unauthorized(
                "Resource visibility not match".to_string(),
            ));
        }

        let mut resource = self
            .resources
            .get_resource(&FindResource::by_id(id).with_blob())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resource not found: {}", id)))?;

        if visibility == Visibility::Private && requester != Some(resource.creator_id) {
            return Err(AppError::Unauthorized(
                "Resource visibility not match".to_string(),
            ));
        }

        let mut content = match resource.location.take() {
            Some(ResourceLocation::Inline(blob)) => ResourceContent::Bytes(Bytes::from(blob)),
            Some(ResourceLocation::Local(path)) => open_local(&path).await?,
            // Remote objects are fetched by clients from their link, never proxied.
            Some(ResourceLocation::External(_)) | None => ResourceContent::Bytes(Bytes::new()),
        };

        if thumbnail && is_thumbnail_supported(normalize_mime_type(&resource.content_type)) {
            let source = content.into_bytes().await?;
            let key = ThumbnailKey::new(resource.id, resource.extension());

            content = match self.thumbnails.get_or_create(source.clone(), &key).await {
                Ok((thumbnail, outcome)) => {
                    tracing::debug!(?outcome, "Serving thumbnail");
                    ResourceContent::Bytes(thumbnail)
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.thumbnails.path_for(&key).display(),
                        error = %e,
                        "Failed to get or generate local thumbnail"
                    );
                    ResourceContent::Bytes(source)
                }
            };
        }

        Ok(ServedResource { resource, content })
    }
}

async fn open_local(path: &str) -> Result<ResourceContent, AppError> {
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        AppError::Io(format!("Failed to open the local resource {}: {}", path, e))
    })?;
    let len = file
        .metadata()
        .await
        .map_err(|e| AppError::Io(format!("Failed to read the local resource {}: {}", path, e)))?
        .len();
    Ok(ResourceContent::File { file, len })
}
