//! Authenticated resource management: create, list, rename and delete.

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use memos_core::models::{
    CreateResourceRequest, ListResourcesQuery, ResourceResponse, UpdateResourceRequest,
};
use std::sync::Arc;

/// Create a resource from JSON.
///
/// Without a link only the record is created. With a link the record points at
/// it, unless `downloadToLocal` is set: then the link is fetched and the bytes
/// go to the active storage backend.
#[utoipa::path(
    post,
    path = "/api/v1/resource",
    tag = "resource",
    request_body = CreateResourceRequest,
    responses(
        (status = 200, description = "Resource created", body = ResourceResponse),
        (status = 400, description = "Invalid link or file too large", body = ErrorResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = user.user_id, operation = "create_resource")
)]
pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateResourceRequest>,
) -> Result<Json<ResourceResponse>, HttpAppError> {
    let resource = state
        .resources
        .create_from_request(user.user_id, request)
        .await?;
    Ok(Json(resource.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/resource/blob",
    tag = "resource",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resource uploaded", body = ResourceResponse),
        (status = 400, description = "Missing file or file too large", body = ErrorResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 502, description = "Remote storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(user_id = user.user_id, operation = "upload_resource")
)]
pub async fn upload_resource(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<ResourceResponse>, HttpAppError> {
    let limit = state.resources.upload_size_limit().await?;
    let upload = extract_multipart_file(multipart, limit).await?;

    let resource = state
        .resources
        .create_from_upload(user.user_id, upload, limit)
        .await?;
    Ok(Json(resource.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/resource",
    tag = "resource",
    params(ListResourcesQuery),
    responses(
        (status = 200, description = "Resources of the caller, newest first", body = Vec<ResourceResponse>),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = user.user_id, operation = "list_resources"))]
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListResourcesQuery>,
) -> Result<Json<Vec<ResourceResponse>>, HttpAppError> {
    let resources = state.resources.list(user.user_id, query).await?;
    Ok(Json(resources.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/resource/{id}",
    tag = "resource",
    params(("id" = i32, Path, description = "Resource ID")),
    request_body = UpdateResourceRequest,
    responses(
        (status = 200, description = "Resource updated", body = ResourceResponse),
        (status = 401, description = "Not the creator of the resource", body = ErrorResponse),
        (status = 404, description = "Resource not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = user.user_id, resource_id = id, operation = "update_resource")
)]
pub async fn update_resource(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateResourceRequest>,
) -> Result<Json<ResourceResponse>, HttpAppError> {
    let resource = state.resources.update(user.user_id, id, request).await?;
    Ok(Json(resource.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/resource/{id}",
    tag = "resource",
    params(("id" = i32, Path, description = "Resource ID")),
    responses(
        (status = 204, description = "Resource deleted"),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 404, description = "Resource not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = user.user_id, resource_id = id, operation = "delete_resource")
)]
pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, HttpAppError> {
    state.resources.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
