//! Public delivery route: `/o/r/{id}`, optionally followed by a filename.
//!
//! Anonymous callers are allowed; access is decided by the effective
//! visibility of the resource. Audio and video honour single byte ranges.

use crate::auth::MaybeAuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::ResourceContent;
use crate::state::AppState;
use crate::utils::mime::{response_content_type, supports_range};
use crate::utils::range::{parse_range, ByteRange};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use memos_core::AppError;
use serde::Deserialize;
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

const CACHE_CONTROL: &str = "max-age=31536000, immutable";
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'";
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Matches both `/o/r/{id}` and `/o/r/{id}/{*filename}`; the filename is ignored.
#[derive(Debug, Deserialize)]
pub struct ServeResourcePath {
    pub id: i32,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ServeResourceQuery {
    /// `1` to receive a 512px wide thumbnail of PNG and JPEG images.
    pub thumbnail: Option<String>,
}

#[utoipa::path(
    get,
    path = "/o/r/{id}",
    tag = "resource",
    params(
        ("id" = i32, Path, description = "Resource ID"),
        ServeResourceQuery
    ),
    responses(
        (status = 200, description = "Resource bytes"),
        (status = 206, description = "Requested byte range of an audio or video resource"),
        (status = 401, description = "Resource visibility not match", body = ErrorResponse),
        (status = 404, description = "Resource not found", body = ErrorResponse),
        (status = 416, description = "Requested range not satisfiable")
    )
)]
#[tracing::instrument(
    skip(state, headers, query),
    fields(resource_id = path.id, operation = "serve_resource")
)]
pub async fn serve_resource(
    State(state): State<Arc<AppState>>,
    user: MaybeAuthUser,
    Path(path): Path<ServeResourcePath>,
    Query(query): Query<ServeResourceQuery>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let thumbnail = query.thumbnail.as_deref() == Some("1");
    let served = state
        .resources
        .serve(user.user_id(), path.id, thumbnail)
        .await?;
    let resource = served.resource;
    let content = served.content;

    let builder = Response::builder()
        .header(
            header::CONTENT_TYPE,
            response_content_type(&resource.content_type),
        )
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .header(header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY);

    if !supports_range(&resource.content_type) {
        let len = content.len();
        return builder
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, len)
            .body(full_body(content))
            .map_err(build_error);
    }

    let mut builder = builder.header(header::ACCEPT_RANGES, "bytes");
    if let Some(modified) = chrono::DateTime::from_timestamp(resource.updated_ts, 0) {
        builder = builder.header(
            header::LAST_MODIFIED,
            modified.format(HTTP_DATE_FORMAT).to_string(),
        );
    }

    let total = content.len();
    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let range = parse_range(range_header, total);

    match range {
        ByteRange::Full => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, total)
            .body(full_body(content))
            .map_err(build_error),
        ByteRange::Partial { start, end } => {
            let content_range = range.content_range(total).unwrap_or_default();
            let body = partial_body(content, start, end).await?;
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, content_range)
                .header(header::CONTENT_LENGTH, end - start + 1)
                .body(body)
                .map_err(build_error)
        }
        ByteRange::Unsatisfiable => {
            tracing::debug!(range = ?range_header, total, "Unsatisfiable range");
            builder
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(
                    header::CONTENT_RANGE,
                    range.content_range(total).unwrap_or_default(),
                )
                .body(Body::empty())
                .map_err(build_error)
        }
    }
}

fn full_body(content: ResourceContent) -> Body {
    match content {
        ResourceContent::Bytes(bytes) => Body::from(bytes),
        ResourceContent::File { file, .. } => Body::from_stream(ReaderStream::new(file)),
    }
}

async fn partial_body(content: ResourceContent, start: u64, end: u64) -> Result<Body, AppError> {
    match content {
        ResourceContent::Bytes(bytes) => Ok(Body::from(
            bytes.slice(start as usize..=end as usize),
        )),
        ResourceContent::File { mut file, .. } => {
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|e| AppError::Io(format!("Failed to seek the local resource: {}", e)))?;
            let limited = file.take(end - start + 1);
            Ok(Body::from_stream(ReaderStream::new(limited)))
        }
    }
}

fn build_error(e: axum::http::Error) -> HttpAppError {
    tracing::error!(error = %e, "Failed to build response");
    HttpAppError(AppError::Internal(e.to_string()))
}
