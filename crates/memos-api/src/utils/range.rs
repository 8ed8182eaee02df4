//! `Range: bytes=` handling for media delivery.
//!
//! Only a single range is honoured. Multi-range and malformed headers fall back
//! to the full body.

/// Outcome of interpreting a `Range` header against a body of known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Serve the whole body with 200.
    Full,
    /// Serve `start..=end` with 206.
    Partial { start: u64, end: u64 },
    /// No overlap with the body; 416 with `bytes */len`.
    Unsatisfiable,
}

impl ByteRange {
    pub fn content_range(&self, len: u64) -> Option<String> {
        match self {
            ByteRange::Full => None,
            ByteRange::Partial { start, end } => Some(format!("bytes {}-{}/{}", start, end, len)),
            ByteRange::Unsatisfiable => Some(format!("bytes */{}", len)),
        }
    }
}

pub fn parse_range(header: Option<&str>, len: u64) -> ByteRange {
    let Some(ranges) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return ByteRange::Full;
    };
    if ranges.contains(',') {
        return ByteRange::Full;
    }
    let Some((first, last)) = ranges.trim().split_once('-') else {
        return ByteRange::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    // Suffix form: last N bytes.
    if first.is_empty() {
        return match last.parse::<u64>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(_) if len == 0 => ByteRange::Unsatisfiable,
            Ok(n) => ByteRange::Partial {
                start: len.saturating_sub(n),
                end: len - 1,
            },
            Err(_) => ByteRange::Full,
        };
    }

    let Ok(start) = first.parse::<u64>() else {
        return ByteRange::Full;
    };

    let end = if last.is_empty() {
        None
    } else {
        match last.parse::<u64>() {
            Ok(end) if end >= start => Some(end),
            _ => return ByteRange::Full,
        }
    };

    if start >= len {
        return ByteRange::Unsatisfiable;
    }

    ByteRange::Partial {
        start,
        end: end.map_or(len - 1, |end| end.min(len - 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_header_is_full() {
        assert_eq!(parse_range(None, 10), ByteRange::Full);
    }

    #[test]
    fn test_closed_range() {
        assert_eq!(
            parse_range(Some("bytes=0-3"), 10),
            ByteRange::Partial { start: 0, end: 3 }
        );
        assert_eq!(
            ByteRange::Partial { start: 0, end: 3 }.content_range(10).as_deref(),
            Some("bytes 0-3/10")
        );
    }

    #[test]
    fn test_open_and_clamped_ranges() {
        assert_eq!(
            parse_range(Some("bytes=4-"), 10),
            ByteRange::Partial { start: 4, end: 9 }
        );
        assert_eq!(
            parse_range(Some("bytes=4-100"), 10),
            ByteRange::Partial { start: 4, end: 9 }
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range(Some("bytes=-3"), 10),
            ByteRange::Partial { start: 7, end: 9 }
        );
        assert_eq!(
            parse_range(Some("bytes=-30"), 10),
            ByteRange::Partial { start: 0, end: 9 }
        );
        assert_eq!(parse_range(Some("bytes=-0"), 10), ByteRange::Unsatisfiable);
    }

    #[test]
    fn test_unsatisfiable() {
        assert_eq!(parse_range(Some("bytes=10-"), 10), ByteRange::Unsatisfiable);
        assert_eq!(parse_range(Some("bytes=0-1"), 0), ByteRange::Unsatisfiable);
        assert_eq!(
            ByteRange::Unsatisfiable.content_range(10).as_deref(),
            Some("bytes */10")
        );
    }

    #[test]
    fn test_malformed_and_multi_range_fall_back() {
        assert_eq!(parse_range(Some("items=0-1"), 10), ByteRange::Full);
        assert_eq!(parse_range(Some("bytes=a-b"), 10), ByteRange::Full);
        assert_eq!(parse_range(Some("bytes=5-2"), 10), ByteRange::Full);
        assert_eq!(parse_range(Some("bytes=0-1,4-5"), 10), ByteRange::Full);
    }
}
