//! Memos Processing Library
//!
//! Image work for resource delivery: EXIF orientation and the bounded,
//! on-disk thumbnail cache.

pub mod image;
pub mod thumbnail;

pub use thumbnail::{
    is_thumbnail_supported, CacheOutcome, ThumbnailCache, ThumbnailError, ThumbnailKey,
    DEFAULT_MAX_CONCURRENCY, THUMBNAIL_CACHE_DIR, THUMBNAIL_WIDTH,
};
