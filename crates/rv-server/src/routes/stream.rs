//! Media and thumbnail streaming handlers.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::Extension;
use rv_core::{AlbumId, Error, MediaId};
use rv_db::queries::{albums, media_items};

use super::streaming_helpers::{serve_stored_file, CachePolicy};
use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// GET /media/stream/{id}
///
/// Full body, or a chunk-capped 206 when a `Range` header is sent for video.
pub async fn stream_media(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    serve_media(&ctx, &id, range)
        .await
        .map_err(|e| AppError::new(e).with_request_id(request_id.0))
}

async fn serve_media(ctx: &AppContext, id: &str, range: Option<&str>) -> Result<Response, Error> {
    let media_id: MediaId = id
        .parse()
        .map_err(|_| Error::Validation(format!("Invalid media id '{id}'")))?;

    let item = {
        let conn = rv_db::pool::get_conn(&ctx.db)?;
        media_items::get_media_item(&conn, media_id)?
    };
    let Some(item) = item else {
        tracing::info!(%media_id, "No media reference for id");
        return Err(Error::not_found("media", media_id));
    };

    serve_stored_file(ctx, &item.path, range, CachePolicy::Immutable).await
}

/// GET /media/thumb/{album_id}
pub async fn album_thumbnail(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(album_id): Path<String>,
) -> Result<Response, AppError> {
    serve_thumbnail(&ctx, &album_id)
        .await
        .map_err(|e| AppError::new(e).with_request_id(request_id.0))
}

async fn serve_thumbnail(ctx: &AppContext, album_id: &str) -> Result<Response, Error> {
    let album_id: AlbumId = album_id
        .parse()
        .map_err(|_| Error::Validation(format!("Invalid album id '{album_id}'")))?;

    let album = {
        let conn = rv_db::pool::get_conn(&ctx.db)?;
        albums::get_album(&conn, album_id)?
    }
    .ok_or_else(|| Error::not_found("album", album_id))?;

    let Some(thumbnail) = album.thumbnail_path else {
        return Err(Error::not_found("thumbnail", album_id));
    };

    serve_stored_file(ctx, &thumbnail, None, CachePolicy::Revalidate).await
}
