//! Memos Resource API
//!
//! HTTP boundary of the resource subsystem: authenticated resource management
//! under `/api/v1/resource` and visibility-checked delivery under `/o/r/{id}`.

mod api_doc;
mod handlers;
mod telemetry;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;
pub mod utils;

pub use error::ErrorResponse;
pub use state::AppState;
