//! Error types module
//!
//! All failures of the resource subsystem are unified under `AppError`. Each
//! variant describes its own HTTP presentation through `ErrorMetadata`, so the
//! API boundary never has to match on variants itself.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Severity used when an error is logged at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Caller mistakes: bad input, missing records, wrong owner.
    Debug,
    /// Degraded but expected: no thumbnail permit, undecodable image.
    Warn,
    Error,
}

/// Presentation details an error carries into an HTTP response.
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable code such as `NOT_FOUND`.
    fn error_code(&self) -> &'static str;

    /// True when retrying the same request may succeed.
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show to callers.
    fn client_message(&self) -> String;

    /// Hide the underlying cause outside development.
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    /// Malformed input: bad link scheme, missing file, oversize upload.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Local filesystem or stream failure.
    #[error("IO error: {0}")]
    Io(String),

    /// Object storage transport or auth failure.
    #[error("Remote storage error: {0}")]
    RemoteStorage(String),

    /// Thumbnail generation permits exhausted.
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    /// Unknown or unsupported storage backend selected by the operator.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

/// How a variant is presented at the HTTP boundary.
#[derive(Debug, Clone, Copy)]
struct Presentation {
    status: u16,
    code: &'static str,
    recoverable: bool,
    action: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

fn presentation(err: &AppError) -> Presentation {
    let (status, code, recoverable, action, sensitive, level) = match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Sign in or check the access token"),
            false,
            LogLevel::Debug,
        ),
        AppError::Io(_) => (
            500,
            "IO_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::RemoteStorage(_) => (
            502,
            "REMOTE_STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::CapacityExceeded(_) => (
            503,
            "CAPACITY_EXCEEDED",
            true,
            Some("Wait a few seconds and retry"),
            false,
            LogLevel::Warn,
        ),
        AppError::ImageProcessing(_) => (
            422,
            "IMAGE_PROCESSING_ERROR",
            false,
            Some("Check image format and try a different file"),
            false,
            LogLevel::Warn,
        ),
        AppError::Configuration(_) => (
            500,
            "CONFIGURATION_ERROR",
            false,
            Some("Contact the instance administrator"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    };
    Presentation {
        status,
        code,
        recoverable,
        action,
        sensitive,
        level,
    }
}

impl AppError {
    /// Variant name, used in development error bodies.
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Validation(_) => "Validation",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Io(_) => "Io",
            AppError::RemoteStorage(_) => "RemoteStorage",
            AppError::CapacityExceeded(_) => "CapacityExceeded",
            AppError::ImageProcessing(_) => "ImageProcessing",
            AppError::Configuration(_) => "Configuration",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// The error followed by up to five `Caused by:` lines from its source chain.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        const MAX_CAUSES: usize = 5;
        let causes: Vec<_> =
            std::iter::successors(self.source(), |&err| err.source()).collect();

        let mut details = self.to_string();
        for cause in causes.iter().take(MAX_CAUSES) {
            details.push_str(&format!("\n  Caused by: {}", cause));
        }
        if causes.len() > MAX_CAUSES {
            details.push_str("\n  ... (truncated)");
        }
        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        presentation(self).status
    }

    fn error_code(&self) -> &'static str {
        presentation(self).code
    }

    fn is_recoverable(&self) -> bool {
        presentation(self).recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        presentation(self).action
    }

    fn is_sensitive(&self) -> bool {
        presentation(self).sensitive
    }

    fn log_level(&self) -> LogLevel {
        presentation(self).level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Io(_) => "Failed to access local storage".to_string(),
            AppError::RemoteStorage(_) => "Failed to access remote storage".to_string(),
            AppError::Configuration(_) => "Storage is misconfigured".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            AppError::Validation(ref msg)
            | AppError::NotFound(ref msg)
            | AppError::Unauthorized(ref msg)
            | AppError::CapacityExceeded(ref msg)
            | AppError::ImageProcessing(ref msg) => msg.clone(),
        }
    }
}
