//! Liveness probe.

use axum::{http::StatusCode, response::IntoResponse, Json};

#[derive(serde::Serialize)]
struct LivenessResponse {
    status: &'static str,
}

pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(LivenessResponse { status: "alive" }))
}
