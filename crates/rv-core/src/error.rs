//! Unified error type for reelvault.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for route handlers to derive an HTTP status code via [`Error::http_status`].

use std::fmt;

/// Unified error type covering every failure mode of the streaming and
/// upload paths.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity (or its physical file) could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "media", "album", "file").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The requested byte range starts at or beyond the end of the file.
    #[error("Range not satisfiable for file of {size} bytes")]
    RangeNotSatisfiable {
        /// Total size of the file, echoed in `Content-Range: bytes */<size>`.
        size: u64,
    },

    /// An upload completed but produced a zero-byte file.
    #[error("Upload produced an empty file: {path}")]
    EmptyWrite {
        /// Destination path that was written (and removed).
        path: String,
    },

    /// An upload finished but its output could not be verified on disk.
    #[error("Upload verification failed for {path}: {reason}")]
    WriteVerification {
        /// Destination path that failed verification.
        path: String,
        /// Human-readable description of what was wrong.
        reason: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request body exceeded the configured upload limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An uploaded image could not be decoded or re-encoded.
    #[error("Image error: {0}")]
    Image(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::RangeNotSatisfiable { .. } => 416,
            Error::EmptyWrite { .. } => 400,
            Error::WriteVerification { .. } => 500,
            Error::Validation(_) => 400,
            Error::PayloadTooLarge(_) => 413,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Tool { .. } => 502,
            Error::Image(_) => 422,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            Error::EmptyWrite { .. } => "empty_write",
            Error::WriteVerification { .. } => "write_verification",
            Error::Validation(_) => "validation_error",
            Error::PayloadTooLarge(_) => "payload_too_large",
            Error::Database { .. } => "database_error",
            Error::Io { .. } => "io_error",
            Error::Tool { .. } => "tool_error",
            Error::Image(_) => "image_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::WriteVerification`].
    pub fn write_verification(path: impl fmt::Display, reason: impl Into<String>) -> Self {
        Error::WriteVerification {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("media", 999999);
        assert_eq!(err.to_string(), "media not found: 999999");
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn range_not_satisfiable_is_416() {
        let err = Error::RangeNotSatisfiable { size: 1000 };
        assert_eq!(err.http_status(), 416);
        assert!(err.to_string().contains("1000"));
    }

    #[test]
    fn empty_write_display() {
        let err = Error::EmptyWrite {
            path: "album/video_1.mp4".into(),
        };
        assert_eq!(
            err.to_string(),
            "Upload produced an empty file: album/video_1.mp4"
        );
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn write_verification_display() {
        let err = Error::write_verification("album/video_1.mp4", "file missing after write");
        assert!(err.to_string().contains("file missing after write"));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn payload_too_large_is_413() {
        let err = Error::PayloadTooLarge("limit is 65536 bytes".into());
        assert_eq!(err.http_status(), 413);
        assert_eq!(err.code(), "payload_too_large");
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn database_display() {
        let err = Error::database("connection refused");
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.code(), "database_error");
    }
}
