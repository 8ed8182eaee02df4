//! Materialize an external link into local bytes.

use crate::utils::mime::{extension_for_content_type, normalize_mime_type};
use crate::utils::ssrf::validate_external_host;
use crate::utils::upload::validate_file_size;
use bytes::{Bytes, BytesMut};
use memos_core::AppError;
use percent_encoding::percent_decode_str;
use reqwest::Url;
use std::path::Path;
use std::time::Duration;

const FALLBACK_FILENAME: &str = "file";

#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Only `http` and `https` links are accepted.
pub fn parse_external_link(link: &str) -> Result<Url, AppError> {
    let url = Url::parse(link)
        .map_err(|e| AppError::Validation(format!("Invalid external link: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(AppError::Validation(
            "Invalid external link scheme".to_string(),
        )),
    }
}

/// Last path segment of the link, percent-decoded, with an extension guessed
/// from the content type when it has none.
pub fn filename_from_url(url: &Url, content_type: &str) -> String {
    let mut filename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| {
            percent_decode_str(segment)
                .decode_utf8_lossy()
                .replace(['/', '\\'], "_")
        })
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

    if Path::new(&filename).extension().is_none() {
        if let Some(ext) = extension_for_content_type(content_type) {
            filename.push_str(ext);
        }
    }
    filename
}

#[derive(Clone)]
pub struct ExternalFetcher {
    client: reqwest::Client,
    allow_private_ips: bool,
}

impl ExternalFetcher {
    /// `allow_private_ips` disables the private-network host check.
    pub fn new(timeout: Duration, allow_private_ips: bool) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            allow_private_ips,
        })
    }

    /// GET the link and buffer at most `limit` bytes of it.
    #[tracing::instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &Url, limit: u64) -> Result<FetchedFile, AppError> {
        validate_external_host(url, self.allow_private_ips).await?;

        let mut response = self.client.get(url.clone()).send().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to request external link");
            AppError::Validation(format!("Failed to request {}", url))
        })?;

        if !response.status().is_success() {
            return Err(AppError::Validation(format!(
                "Failed to request {}: status {}",
                url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(normalize_mime_type)
            .filter(|ct| !ct.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation(format!("Failed to read mime from {}", url)))?;

        if let Some(declared) = response.content_length() {
            validate_file_size(declared, limit)?;
        }

        let mut data = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read {}: {}", url, e)))?
        {
            validate_file_size((data.len() + chunk.len()) as u64, limit)?;
            data.extend_from_slice(&chunk);
        }

        tracing::info!(size_bytes = data.len(), content_type = %content_type, "External link fetched");

        Ok(FetchedFile {
            filename: filename_from_url(url, &content_type),
            content_type,
            data: data.freeze(),
        })
    }
}
