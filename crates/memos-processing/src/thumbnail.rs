//! On-disk thumbnail cache.
//!
//! Thumbnails live at `<data>/.thumbnail_cache/<resource id><extension>`.
//! An existing file is always served as-is; entries are removed only when the
//! resource is deleted. Generation work is bounded by a permit pool and never
//! waits for a permit.

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::image::ImageOrientation;
use memos_core::AppError;

pub const THUMBNAIL_CACHE_DIR: &str = ".thumbnail_cache";
pub const THUMBNAIL_WIDTH: u32 = 512;
pub const DEFAULT_MAX_CONCURRENCY: usize = 32;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("not enough available thumbnail generators")]
    CapacityExceeded,

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode thumbnail: {0}")]
    Encode(String),

    #[error("thumbnail cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("thumbnail task failed: {0}")]
    Task(String),
}

impl From<ThumbnailError> for AppError {
    fn from(err: ThumbnailError) -> Self {
        match err {
            ThumbnailError::CapacityExceeded => AppError::CapacityExceeded(err.to_string()),
            ThumbnailError::Decode(_) | ThumbnailError::Encode(_) => {
                AppError::ImageProcessing(err.to_string())
            }
            ThumbnailError::Io(e) => AppError::Io(e.to_string()),
            ThumbnailError::Task(msg) => AppError::Internal(msg),
        }
    }
}

/// Whether thumbnails can be produced for this content type.
pub fn is_thumbnail_supported(content_type: &str) -> bool {
    matches!(content_type, "image/png" | "image/jpeg")
}

/// Cache key: resource identity plus the original file extension (with dot).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey {
    pub resource_id: i32,
    pub extension: String,
}

impl ThumbnailKey {
    pub fn new(resource_id: i32, extension: impl Into<String>) -> Self {
        ThumbnailKey {
            resource_id,
            extension: extension.into(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}{}", self.resource_id, self.extension)
    }
}

/// Whether `get_or_create` served an existing entry or generated a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Generated,
}

#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    cache_dir: PathBuf,
    permits: Arc<Semaphore>,
}

impl ThumbnailCache {
    pub fn new(data_dir: &Path, max_concurrency: usize) -> Self {
        ThumbnailCache {
            cache_dir: data_dir.join(THUMBNAIL_CACHE_DIR),
            permits: Arc::new(Semaphore::new(max_concurrency)),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn path_for(&self, key: &ThumbnailKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Return the cached thumbnail for `key`, generating it from `source` on a miss.
    #[tracing::instrument(skip(self, source), fields(resource_id = key.resource_id))]
    pub async fn get_or_create(
        &self,
        source: Bytes,
        key: &ThumbnailKey,
    ) -> Result<(Bytes, CacheOutcome), ThumbnailError> {
        let path = self.path_for(key);

        let cached = tokio::fs::try_exists(&path).await.map_err(|e| {
            ThumbnailError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to check thumbnail {}: {}", path.display(), e),
            ))
        })?;
        if cached {
            let data = tokio::fs::read(&path).await?;
            return Ok((Bytes::from(data), CacheOutcome::Hit));
        }

        let permit = self
            .permits
            .clone()
            .try_acquire_owned()
            .map_err(|_| ThumbnailError::CapacityExceeded)?;

        let start = std::time::Instant::now();
        let cache_dir = self.cache_dir.clone();
        let target = path.clone();
        let extension = key.extension.clone();

        tokio::task::spawn_blocking(move || {
            // Held for the whole generation; released on every exit path.
            let _permit = permit;
            generate(&source, &cache_dir, &target, &extension)
        })
        .await
        .map_err(|e| ThumbnailError::Task(e.to_string()))??;

        let data = tokio::fs::read(&path).await?;

        tracing::info!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Thumbnail generated"
        );

        Ok((Bytes::from(data), CacheOutcome::Generated))
    }

    /// Delete the cache entry for `key`.
    pub async fn remove(&self, key: &ThumbnailKey) -> std::io::Result<()> {
        tokio::fs::remove_file(self.path_for(key)).await
    }
}

fn output_format(extension: &str, guessed: Option<ImageFormat>) -> ImageFormat {
    ImageFormat::from_extension(extension.trim_start_matches('.'))
        .or(guessed)
        .unwrap_or(ImageFormat::Png)
}

/// Decode, orient, resize and persist one thumbnail. Runs on the blocking pool.
fn generate(
    source: &[u8],
    cache_dir: &Path,
    target: &Path,
    extension: &str,
) -> Result<(), ThumbnailError> {
    let reader = image::ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| ThumbnailError::Decode(e.to_string()))?;
    let guessed = reader.format();
    let img = reader
        .decode()
        .map_err(|e| ThumbnailError::Decode(e.to_string()))?;

    let img = ImageOrientation::apply_exif_orientation(img, source);
    let thumbnail = resize_to_width(&img, THUMBNAIL_WIDTH);

    let format = output_format(extension, guessed);
    let thumbnail = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(thumbnail.to_rgb8()),
        _ => thumbnail,
    };

    std::fs::create_dir_all(cache_dir)?;

    // Write next to the target, then rename, so readers never see a partial file.
    let temp = tempfile::NamedTempFile::new_in(cache_dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        thumbnail
            .write_to(&mut writer, format)
            .map_err(|e| ThumbnailError::Encode(e.to_string()))?;
        writer.flush()?;
    }
    temp.persist(target).map_err(|e| ThumbnailError::Io(e.error))?;

    Ok(())
}

/// Resize to a fixed width, preserving aspect ratio, with Lanczos3 resampling.
fn resize_to_width(img: &DynamicImage, width: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img.clone();
    }
    let height = ((h as u64 * width as u64 + w as u64 / 2) / w as u64).max(1) as u32;
    img.resize_exact(width, height, FilterType::Lanczos3)
}
