//! On-disk storage layout.
//!
//! Files live at `<root>/<album folder>/<prefix>_<unix-millis>.<ext>`. The
//! metadata store only ever sees the part after `<root>/`, with every path
//! segment percent-encoded, so a reference can be decoded back to the exact
//! segments it was built from.

use std::path::{Component, Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rv_core::{Error, MediaKind, Result};

/// Characters left unescaped in a stored segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Handle on the storage root directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute directory of an album folder.
    ///
    /// `folder` must be a single name as produced by
    /// [`sanitize_folder_name`]; anything else is a validation error.
    pub fn album_dir(&self, folder: &str) -> Result<PathBuf> {
        if !is_plain_segment(folder) {
            return Err(Error::Validation(format!(
                "invalid album folder name '{folder}'"
            )));
        }
        Ok(self.root.join(folder))
    }

    /// Turn a stored reference into an absolute path under the root.
    ///
    /// Leading slashes are ignored. A reference that would escape the root
    /// (absolute, `..`, empty segments) is reported as not found.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let relative = decode_reference(reference).ok_or_else(|| {
            tracing::warn!(reference, "Rejected stored media path");
            Error::not_found("file", reference)
        })?;
        Ok(self.root.join(relative))
    }

    /// Build the stored reference for `file_name` inside `folder`.
    pub fn reference_for(folder: &str, file_name: &str) -> String {
        format!("{}/{}", encode_segment(folder), encode_segment(file_name))
    }
}

/// Percent-encode one path segment.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Decode a stored reference into a relative path of plain segments.
pub fn decode_reference(reference: &str) -> Option<PathBuf> {
    let trimmed = reference.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let mut out = PathBuf::new();
    for raw in trimmed.split('/') {
        let segment = percent_decode_str(raw).decode_utf8().ok()?;
        if !is_plain_segment(&segment) {
            return None;
        }
        out.push(segment.as_ref());
    }

    // rejects drive prefixes on windows
    if out.components().all(|c| matches!(c, Component::Normal(_))) {
        Some(out)
    } else {
        None
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

/// Derive an album folder name from its title.
///
/// Path separators and control characters become `_`, surrounding
/// whitespace is trimmed. Returns `None` when nothing usable is left, in
/// which case the caller falls back to an id-based name.
pub fn sanitize_folder_name(title: &str) -> Option<String> {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if is_plain_segment(&cleaned) {
        Some(cleaned)
    } else {
        None
    }
}

/// `video_<millis>.mp4` or `photo_<millis>.webp`.
pub fn media_file_name(kind: MediaKind, millis: i64) -> String {
    format!(
        "{}_{millis}.{}",
        kind.file_prefix(),
        kind.stored_extension()
    )
}

/// `thumbnail_<millis>_<original name>`, with the original reduced to its
/// final component.
pub fn thumbnail_file_name(original: &str, millis: i64) -> String {
    let base = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(sanitize_folder_name)
        .unwrap_or_else(|| "image".into());
    format!("thumbnail_{millis}_{base}")
}

/// Current wall-clock time in unix milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_roundtrips_through_resolve() {
        let storage = Storage::new("/srv/media");
        let reference = Storage::reference_for("Summer 2024 #1", "video_17.mp4");
        assert_eq!(reference, "Summer%202024%20%231/video_17.mp4");

        let path = storage.resolve(&reference).unwrap();
        assert_eq!(path, PathBuf::from("/srv/media/Summer 2024 #1/video_17.mp4"));
    }

    #[test]
    fn resolve_tolerates_leading_slash() {
        let storage = Storage::new("/srv/media");
        let path = storage.resolve("/Album/photo_1.webp").unwrap();
        assert_eq!(path, PathBuf::from("/srv/media/Album/photo_1.webp"));
    }

    #[test]
    fn resolve_decodes_legacy_escapes() {
        let storage = Storage::new("/srv");
        let path = storage.resolve("My%20Trip/clip.mp4").unwrap();
        assert_eq!(path, PathBuf::from("/srv/My Trip/clip.mp4"));
    }

    #[test]
    fn resolve_rejects_escapes_from_root() {
        let storage = Storage::new("/srv/media");
        for bad in [
            "../etc/passwd",
            "a/%2E%2E/%2E%2E/etc",
            "a/b%2Fc",
            "a//b",
            "",
            "/",
            "a/%FF",
        ] {
            let err = storage.resolve(bad).unwrap_err();
            assert!(matches!(err, Error::NotFound { .. }), "{bad} should be rejected");
        }
    }

    #[test]
    fn sanitize_titles() {
        assert_eq!(sanitize_folder_name("  Holiday  ").as_deref(), Some("Holiday"));
        assert_eq!(sanitize_folder_name("a/b\\c").as_deref(), Some("a_b_c"));
        assert_eq!(sanitize_folder_name("tab\there").as_deref(), Some("tab_here"));
        assert_eq!(sanitize_folder_name(".."), None);
        assert_eq!(sanitize_folder_name("."), None);
        assert_eq!(sanitize_folder_name("   "), None);
    }

    #[test]
    fn album_dir_requires_plain_name() {
        let storage = Storage::new("/srv");
        assert_eq!(storage.album_dir("A").unwrap(), PathBuf::from("/srv/A"));
        assert!(storage.album_dir("..").is_err());
        assert!(storage.album_dir("a/b").is_err());
    }

    #[test]
    fn file_names() {
        assert_eq!(media_file_name(MediaKind::Video, 42), "video_42.mp4");
        assert_eq!(media_file_name(MediaKind::Photo, 42), "photo_42.webp");
        assert_eq!(thumbnail_file_name("/tmp/cover.jpg", 7), "thumbnail_7_cover.jpg");
        assert_eq!(thumbnail_file_name("..", 7), "thumbnail_7_image");
    }
}
