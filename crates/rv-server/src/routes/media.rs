//! Upload and delete handlers for media items.

use std::io;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use futures::TryStreamExt;
use rv_core::{mime_for_path, AlbumId, Error, MediaId, MediaKind};
use rv_db::models::MediaItem;
use rv_db::queries::{albums, media_items};
use rv_media::{IncomingFile, MediaReference};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Public view of a media item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemResponse {
    pub id: MediaId,
    pub album_id: AlbumId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub mime: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub created_at: String,
}

impl MediaItemResponse {
    pub fn from_model(item: &MediaItem, stored: Option<&MediaReference>) -> Self {
        Self {
            id: item.id,
            album_id: item.album_id,
            name: item.name.clone(),
            kind: item.kind,
            url: format!("/media/stream/{}", item.id),
            mime: stored
                .map(|s| s.mime)
                .unwrap_or_else(|| mime_for_path(std::path::Path::new(&item.path))),
            size: stored.map(|s| s.size),
            created_at: item.created_at.clone(),
        }
    }
}

/// Metadata fields collected before the `file` part arrives.
#[derive(Default)]
struct UploadFields {
    name: Option<String>,
    kind: Option<MediaKind>,
    album_id: Option<AlbumId>,
}

/// Classify a multipart failure; a body over the upload limit is a 413.
fn bad_multipart(e: &MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(e.body_text())
    } else {
        Error::Validation(format!("malformed multipart body: {}", e.body_text()))
    }
}

/// The sink sees body failures as I/O errors. Recover the multipart error
/// carried inside so a limit breach mid-stream keeps its status.
fn reclassify_body_error(e: Error) -> Error {
    if let Error::Io { source } = &e {
        if let Some(multipart) = source
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
        {
            return bad_multipart(multipart);
        }
    }
    e
}

/// POST /media
///
/// Multipart fields `name`, `type` (`VIDEO`|`PHOTO`), and `albumId` must
/// precede `file` so the destination is known before any bytes are written.
pub async fn upload_media(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    multipart: Multipart,
) -> Result<Json<MediaItemResponse>, AppError> {
    handle_upload(&ctx, multipart)
        .await
        .map(Json)
        .map_err(|e| AppError::new(e).with_request_id(request_id.0))
}

async fn handle_upload(ctx: &AppContext, mut multipart: Multipart) -> Result<MediaItemResponse, Error> {
    let mut fields = UploadFields::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| bad_multipart(&e))? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => fields.name = Some(field.text().await.map_err(|e| bad_multipart(&e))?),
            "type" => fields.kind = Some(field.text().await.map_err(|e| bad_multipart(&e))?.parse()?),
            "albumId" => {
                let raw = field.text().await.map_err(|e| bad_multipart(&e))?;
                fields.album_id = Some(
                    raw.parse()
                        .map_err(|_| Error::Validation(format!("Invalid albumId '{raw}'")))?,
                );
            }
            "file" => {
                let (Some(name), Some(kind), Some(album_id)) =
                    (fields.name.take(), fields.kind, fields.album_id)
                else {
                    return Err(Error::Validation(
                        "name, type and albumId must be sent before file".into(),
                    ));
                };
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(Error::Validation("name must not be empty".into()));
                }

                let album = {
                    let conn = rv_db::pool::get_conn(&ctx.db)?;
                    albums::get_album(&conn, album_id)?
                }
                .ok_or_else(|| Error::not_found("album", album_id))?;

                let file_name = field.file_name().map(str::to_string);
                let stream = Box::pin(field.map_err(io::Error::other));
                let mut incoming = IncomingFile::new(stream);
                if let Some(file_name) = file_name {
                    incoming = incoming.with_file_name(file_name);
                }

                tracing::info!(album = %album_id, %kind, name = %name, "Receiving upload");
                let stored = ctx
                    .uploads
                    .upload(&album.folder, incoming, kind)
                    .await
                    .map_err(reclassify_body_error)?;

                return record_upload(ctx, album_id, &name, stored).await;
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    Err(Error::Validation("multipart body has no file field".into()))
}

/// Persist the reference. If that fails the stored file is removed so it
/// never becomes an orphan.
async fn record_upload(
    ctx: &AppContext,
    album_id: AlbumId,
    name: &str,
    stored: MediaReference,
) -> Result<MediaItemResponse, Error> {
    let created = rv_db::pool::get_conn(&ctx.db).and_then(|conn| {
        media_items::create_media_item(&conn, album_id, name, stored.kind, &stored.path)
    });

    match created {
        Ok(item) => {
            tracing::info!(media_id = %item.id, path = %stored.path, "Upload recorded");
            Ok(MediaItemResponse::from_model(&item, Some(&stored)))
        }
        Err(e) => {
            remove_stored_file(ctx, &stored.path).await;
            Err(e)
        }
    }
}

async fn remove_stored_file(ctx: &AppContext, reference: &str) {
    let Ok(path) = ctx.storage.resolve(reference) else {
        return;
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!("Stored file {} was already gone", path.display());
        }
        Err(e) => tracing::warn!("Failed to remove {}: {e}", path.display()),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: MediaId,
}

/// DELETE /media?id=...
///
/// Removes the metadata row, then unlinks the file. A failed unlink is
/// logged and does not fail the request.
pub async fn delete_media(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<DeleteResponse>, AppError> {
    let with_id = |e: Error| AppError::new(e).with_request_id(request_id.0.clone());

    let raw = params
        .id
        .ok_or_else(|| with_id(Error::Validation("id query parameter is required".into())))?;
    let media_id: MediaId = raw
        .parse()
        .map_err(|_| with_id(Error::Validation(format!("Invalid media id '{raw}'"))))?;

    let item = {
        let conn = rv_db::pool::get_conn(&ctx.db).map_err(with_id)?;
        let item = media_items::get_media_item(&conn, media_id)
            .map_err(with_id)?
            .ok_or_else(|| with_id(Error::not_found("media", media_id)))?;
        media_items::delete_media_item(&conn, media_id).map_err(with_id)?;
        item
    };

    remove_stored_file(&ctx, &item.path).await;
    tracing::info!(%media_id, "Media deleted");

    Ok(Json(DeleteResponse {
        success: true,
        id: media_id,
    }))
}
