//! Content type helpers

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

const EXTENSIONS: &[(&str, &str)] = &[
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/svg+xml", ".svg"),
    ("image/bmp", ".bmp"),
    ("image/x-icon", ".ico"),
    ("application/pdf", ".pdf"),
    ("application/json", ".json"),
    ("application/zip", ".zip"),
    ("application/gzip", ".gz"),
    ("application/epub+zip", ".epub"),
    ("application/xml", ".xml"),
    ("text/plain", ".txt"),
    ("text/markdown", ".md"),
    ("text/html", ".html"),
    ("text/css", ".css"),
    ("text/csv", ".csv"),
    ("text/javascript", ".js"),
    ("audio/mpeg", ".mp3"),
    ("audio/ogg", ".ogg"),
    ("audio/wav", ".wav"),
    ("audio/webm", ".weba"),
    ("video/mp4", ".mp4"),
    ("video/webm", ".webm"),
    ("video/quicktime", ".mov"),
];

/// Strip parameters: `image/jpeg; charset=utf-8` -> `image/jpeg`.
pub fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .unwrap_or(content_type)
}

/// Conventional file extension (with dot) for a content type.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let normalized = normalize_mime_type(content_type).to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == normalized)
        .map(|(_, ext)| *ext)
}

/// Content type sent when serving a resource. Text is always sent as UTF-8 plain text.
pub fn response_content_type(resource_type: &str) -> String {
    let lowered = resource_type.to_ascii_lowercase();
    if lowered.starts_with("text") {
        TEXT_PLAIN_UTF8.to_string()
    } else {
        lowered
    }
}

/// Audio and video are served with byte-range support.
pub fn supports_range(resource_type: &str) -> bool {
    let lowered = resource_type.to_ascii_lowercase();
    lowered.starts_with("video") || lowered.starts_with("audio")
}
