//! Shared file serving: resolve a stored reference, stat it, and answer with
//! a full body or one capped byte range.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rv_core::{is_video_mime, mime_for_path, Error};
use rv_media::{parse_range_header, stream, ByteRange};

use crate::context::AppContext;

/// Cache directive for range responses; each window is request-specific.
const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// How a full (200) response may be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Uploaded media never changes once stored.
    Immutable,
    /// Thumbnails can be replaced; revalidate hourly.
    Revalidate,
}

impl CachePolicy {
    pub fn header_value(self) -> &'static str {
        match self {
            Self::Immutable => "public, max-age=31536000, immutable",
            Self::Revalidate => "public, max-age=3600, must-revalidate",
        }
    }
}

/// Serve the file behind a stored `reference`.
///
/// `range_header` is honoured only for video MIME types; anything else, or a
/// header that does not parse, gets the full body.
pub async fn serve_stored_file(
    ctx: &AppContext,
    reference: &str,
    range_header: Option<&str>,
    cache: CachePolicy,
) -> Result<Response, Error> {
    let path = ctx.storage.resolve(reference)?;

    let total_size = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => {
            tracing::warn!(reference, "Stored media path is not a regular file");
            return Err(Error::not_found("file", reference));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(reference, path = %path.display(), "Physical file missing for stored media");
            return Err(Error::not_found("file", reference));
        }
        Err(e) => return Err(e.into()),
    };

    let mime = mime_for_path(&path);
    let read_buffer = ctx.config.streaming.read_buffer_bytes;

    let requested = range_header
        .filter(|_| is_video_mime(mime))
        .and_then(parse_range_header);

    match requested {
        Some(requested) => {
            let range = ByteRange::resolve(requested, total_size, ctx.config.streaming.chunk_cap())?;
            let body = stream::open_range(&path, &range, read_buffer).await?;

            tracing::debug!(reference, range = %range.content_range(), "Serving partial content");

            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, mime.to_string()),
                    (header::CONTENT_RANGE, range.content_range()),
                    (header::CONTENT_LENGTH, range.len().to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::CONTENT_DISPOSITION, "inline".to_string()),
                    (header::CACHE_CONTROL, NO_CACHE.to_string()),
                    (header::PRAGMA, "no-cache".to_string()),
                    (header::EXPIRES, "0".to_string()),
                ],
                Body::from_stream(body),
            )
                .into_response())
        }
        None => {
            let body = stream::open_full(&path, total_size, read_buffer).await?;

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime.to_string()),
                    (header::CONTENT_LENGTH, total_size.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::CONTENT_DISPOSITION, "inline".to_string()),
                    (header::CACHE_CONTROL, cache.header_value().to_string()),
                ],
                Body::from_stream(body),
            )
                .into_response())
        }
    }
}
