//! `Range` header parsing and byte-window resolution.

use rv_core::{Error, Result};

/// An inclusive byte window into a file of `total_size` bytes.
///
/// Always satisfies `start <= end < total_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total_size: u64,
}

impl ByteRange {
    /// Number of bytes in the window.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always `false`: a resolved window holds at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for the `Content-Range` header.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }

    /// Resolve a parsed `(start, end?)` request against the file size and the
    /// per-response chunk cap.
    ///
    /// The end is clamped to both the last byte of the file and
    /// `start + max_chunk - 1`, so no response ever carries more than one
    /// chunk. A start at or past the end of the file, or an end before the
    /// start, is [`Error::RangeNotSatisfiable`].
    pub fn resolve(
        requested: (u64, Option<u64>),
        total_size: u64,
        max_chunk: u64,
    ) -> Result<Self> {
        let (start, requested_end) = requested;
        if start >= total_size {
            return Err(Error::RangeNotSatisfiable { size: total_size });
        }

        let last = total_size - 1;
        let chunk_end = start.saturating_add(max_chunk.max(1) - 1);
        let end = requested_end.unwrap_or(last).min(last).min(chunk_end);

        if end < start {
            return Err(Error::RangeNotSatisfiable { size: total_size });
        }

        Ok(Self {
            start,
            end,
            total_size,
        })
    }
}

/// Parse a `Range: bytes=START-END` header value.
///
/// Returns `(start, Option<end>)` where `end` is `None` for open-ended ranges
/// like `bytes=500-`. Anything else (suffix ranges, multiple ranges, other
/// units) yields `None` and is served as a full response.
pub fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let set = value.trim().strip_prefix("bytes=")?;
    if set.contains(',') {
        return None;
    }
    let (start_str, end_str) = set.split_once('-')?;

    let start: u64 = start_str.trim().parse().ok()?;
    let end_str = end_str.trim();
    let end = if end_str.is_empty() {
        None
    } else {
        Some(end_str.parse().ok()?)
    };

    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn parse_range_full() {
        assert_eq!(parse_range_header("bytes=0-999"), Some((0, Some(999))));
    }

    #[test]
    fn parse_range_open_end() {
        assert_eq!(parse_range_header("bytes=500-"), Some((500, None)));
    }

    #[test]
    fn parse_range_invalid() {
        assert!(parse_range_header("invalid").is_none());
        assert!(parse_range_header("bytes=abc-def").is_none());
        assert!(parse_range_header("bytes=-500").is_none());
        assert!(parse_range_header("bytes=0-1,5-9").is_none());
        assert!(parse_range_header("items=0-1").is_none());
    }

    #[test]
    fn resolve_within_cap() {
        let r = ByteRange::resolve((10, Some(20)), 1000, 5 * MIB).unwrap();
        assert_eq!((r.start, r.end, r.len()), (10, 20, 11));
        assert_eq!(r.content_range(), "bytes 10-20/1000");
    }

    #[test]
    fn open_end_is_capped_to_one_chunk() {
        let total = 50 * MIB;
        let r = ByteRange::resolve((0, None), total, 5 * MIB).unwrap();
        assert_eq!(r.end, 5 * MIB - 1);
        assert_eq!(r.len(), 5 * MIB);
    }

    #[test]
    fn explicit_end_beyond_cap_is_capped() {
        let r = ByteRange::resolve((100, Some(100 * MIB)), 200 * MIB, MIB).unwrap();
        assert_eq!(r.end, 100 + MIB - 1);
    }

    #[test]
    fn end_past_eof_is_clamped() {
        let r = ByteRange::resolve((900, Some(5000)), 1000, 5 * MIB).unwrap();
        assert_eq!(r.end, 999);
        assert_eq!(r.content_range(), "bytes 900-999/1000");
    }

    #[test]
    fn start_beyond_eof_is_unsatisfiable() {
        let err = ByteRange::resolve((999_999_999, None), 1000, 5 * MIB).unwrap_err();
        assert!(matches!(err, Error::RangeNotSatisfiable { size: 1000 }));

        let err = ByteRange::resolve((1000, None), 1000, 5 * MIB).unwrap_err();
        assert!(matches!(err, Error::RangeNotSatisfiable { size: 1000 }));
    }

    #[test]
    fn inverted_range_is_unsatisfiable() {
        let err = ByteRange::resolve((50, Some(10)), 1000, 5 * MIB).unwrap_err();
        assert!(matches!(err, Error::RangeNotSatisfiable { .. }));
    }

    #[test]
    fn empty_file_is_unsatisfiable() {
        assert!(ByteRange::resolve((0, None), 0, 5 * MIB).is_err());
    }

    #[test]
    fn last_byte() {
        let r = ByteRange::resolve((999, None), 1000, 5 * MIB).unwrap();
        assert_eq!((r.start, r.end, r.len()), (999, 999, 1));
    }
}
