//! Album listing.

use axum::extract::State;
use axum::Json;
use rv_core::AlbumId;
use rv_db::models::Album;
use rv_db::queries::{albums, media_items};
use serde::Serialize;

use super::media::MediaItemResponse;
use crate::context::AppContext;
use crate::error::AppError;

/// Album with its items. Storage paths are never exposed; clients get URLs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumResponse {
    pub id: AlbumId,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub created_at: String,
    pub items: Vec<MediaItemResponse>,
}

impl AlbumResponse {
    fn from_model(album: &Album, items: Vec<MediaItemResponse>) -> Self {
        Self {
            id: album.id,
            title: album.title.clone(),
            thumbnail_url: album
                .thumbnail_path
                .as_ref()
                .map(|_| format!("/media/thumb/{}", album.id)),
            created_at: album.created_at.clone(),
            items,
        }
    }
}

/// GET /albums
pub async fn list_albums(State(ctx): State<AppContext>) -> Result<Json<Vec<AlbumResponse>>, AppError> {
    let conn = rv_db::pool::get_conn(&ctx.db)?;
    let all = albums::list_albums(&conn)?;

    let mut out = Vec::with_capacity(all.len());
    for album in &all {
        let items = media_items::list_for_album(&conn, album.id)?
            .iter()
            .map(|item| MediaItemResponse::from_model(item, None))
            .collect();
        out.push(AlbumResponse::from_model(album, items));
    }

    Ok(Json(out))
}
