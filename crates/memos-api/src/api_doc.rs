//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use memos_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Memos Resource API",
        version = "0.1.0",
        description = "Resource blob storage and delivery: uploads to the database, the local filesystem or S3-compatible storage, visibility-checked serving with thumbnails and byte ranges."
    ),
    paths(
        handlers::resource::create_resource,
        handlers::resource::upload_resource,
        handlers::resource::list_resources,
        handlers::resource::update_resource,
        handlers::resource::delete_resource,
        handlers::resource_public::serve_resource,
    ),
    components(schemas(
        models::ResourceResponse,
        models::CreateResourceRequest,
        models::UpdateResourceRequest,
        models::Visibility,
        error::ErrorResponse,
    )),
    tags(
        (name = "resource", description = "Resource management and delivery")
    )
)]
struct ApiDoc;
