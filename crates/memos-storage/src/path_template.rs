//! Storage path templates.
//!
//! A template is a path with brace-delimited placeholders, e.g.
//! `assets/{year}/{month}/{filename}`. Tokens that look like placeholders but
//! are not recognized pass through unchanged.

use chrono::{DateTime, Datelike, Timelike, Utc};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[a-z]{1,9}\}").expect("placeholder pattern is valid"));

pub const FILENAME_PLACEHOLDER: &str = "{filename}";

/// Expand every recognized placeholder in `template`.
pub fn resolve(template: &str, filename: &str, now: DateTime<Utc>) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(template, |caps: &Captures<'_>| {
            let token = &caps[0];
            match token {
                "{filename}" => filename.to_string(),
                "{timestamp}" => now.timestamp().to_string(),
                "{year}" => now.year().to_string(),
                "{month}" => format!("{:02}", now.month()),
                "{day}" => format!("{:02}", now.day()),
                "{hour}" => format!("{:02}", now.hour()),
                "{minute}" => format!("{:02}", now.minute()),
                "{second}" => format!("{:02}", now.second()),
                _ => token.to_string(),
            }
        })
        .into_owned()
}

/// Append a `{filename}` segment when the template has none, so every
/// resolved path ends in the uploaded file's name.
pub fn ensure_filename_segment(template: &str) -> String {
    if template.contains(FILENAME_PLACEHOLDER) {
        template.to_string()
    } else if template.is_empty() {
        FILENAME_PLACEHOLDER.to_string()
    } else {
        format!(
            "{}/{}",
            template.trim_end_matches('/'),
            FILENAME_PLACEHOLDER
        )
    }
}
