//! Media-domain types: the upload kind and the extension-based MIME table.
//!
//! MIME classification looks only at the file extension. It never trusts the
//! `Content-Type` an uploader supplied, so the same stored file always gets
//! the same type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::Error;

/// Fallback MIME type for unknown extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Static extension -> MIME table. Extensions are matched lowercase.
const MIME_TABLE: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("ogg", "video/ogg"),
    ("ogv", "video/ogg"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
];

/// Kind of an uploaded media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaKind {
    Video,
    Photo,
}

impl MediaKind {
    /// File-name prefix used for stored files of this kind.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Photo => "photo",
        }
    }

    /// Fixed extension of stored files of this kind.
    pub fn stored_extension(&self) -> &'static str {
        match self {
            Self::Video => "mp4",
            Self::Photo => "webp",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "VIDEO"),
            Self::Photo => write!(f, "PHOTO"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VIDEO" => Ok(Self::Video),
            "PHOTO" => Ok(Self::Photo),
            other => Err(Error::Validation(format!(
                "unknown media type '{other}' (expected VIDEO or PHOTO)"
            ))),
        }
    }
}

/// Classify a path's MIME type from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(mime_for_extension)
        .unwrap_or(OCTET_STREAM)
}

/// Look up an extension (without the dot) in the MIME table.
pub fn mime_for_extension(ext: &str) -> &'static str {
    let ext = ext.to_ascii_lowercase();
    MIME_TABLE
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}

/// Whether a MIME type is a video type eligible for range streaming.
pub fn is_video_mime(mime: &str) -> bool {
    mime.starts_with("video/")
}
