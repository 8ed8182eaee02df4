//! Upload helpers: size limit interpretation and multipart extraction.

use axum::extract::Multipart;
use bytes::{Bytes, BytesMut};
use memos_core::models::DEFAULT_MAX_UPLOAD_SIZE_MIB;
use memos_core::AppError;

pub const MEBIBYTE: u64 = 1024 * 1024;

/// A file received through multipart, fully buffered and within the size limit.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Interpret the raw `max-upload-size-mib` setting as a byte limit.
///
/// Missing means the default. A value that does not parse disables uploads.
pub fn upload_limit_bytes(setting: Option<&str>) -> u64 {
    let Some(raw) = setting.map(str::trim).filter(|v| !v.is_empty()) else {
        return DEFAULT_MAX_UPLOAD_SIZE_MIB as u64 * MEBIBYTE;
    };

    match raw.trim_matches('"').parse::<i64>() {
        Ok(mib) => (mib.max(0) as u64).saturating_mul(MEBIBYTE),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "Failed to parse max upload size");
            0
        }
    }
}

pub fn validate_file_size(size: u64, limit: u64) -> Result<(), AppError> {
    if size > limit {
        return Err(AppError::Validation(format!(
            "File size exceeds allowed limit of {} MiB",
            limit / MEBIBYTE
        )));
    }
    Ok(())
}

/// Read the single `file` field, aborting as soon as it grows past `limit`.
pub async fn extract_multipart_file(
    mut multipart: Multipart,
    limit: u64,
) -> Result<UploadedFile, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse upload data: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut data = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload data: {}", e)))?
        {
            validate_file_size((data.len() + chunk.len()) as u64, limit)?;
            data.extend_from_slice(&chunk);
        }

        return Ok(UploadedFile {
            filename,
            content_type,
            data: data.freeze(),
        });
    }

    Err(AppError::Validation("Upload file not found".to_string()))
}
