//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row` whose columns follow the query module's `COLS` order.

use rusqlite::types::Type;
use rv_core::{AlbumId, MediaId, MediaKind};
use serde::Serialize;

fn parse_kind(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<MediaKind> {
    let s: String = row.get(idx)?;
    s.parse::<MediaKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ---------------------------------------------------------------------------
// Album
// ---------------------------------------------------------------------------

/// A named folder that media is uploaded into.
#[derive(Debug, Clone, Serialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    /// Directory name under the storage root, derived from the title.
    pub folder: String,
    /// Encoded path of the thumbnail, relative to the storage root.
    pub thumbnail_path: Option<String>,
    pub created_at: String,
}

impl Album {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: AlbumId::from(row.get::<_, i64>(0)?),
            title: row.get(1)?,
            folder: row.get(2)?,
            thumbnail_path: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

// ---------------------------------------------------------------------------
// MediaItem
// ---------------------------------------------------------------------------

/// A stored video or photo.
#[derive(Debug, Clone, Serialize)]
pub struct MediaItem {
    pub id: MediaId,
    pub album_id: AlbumId,
    pub name: String,
    pub kind: MediaKind,
    /// Percent-encoded path relative to the storage root.
    pub path: String,
    pub created_at: String,
}

impl MediaItem {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: MediaId::from(row.get::<_, i64>(0)?),
            album_id: AlbumId::from(row.get::<_, i64>(1)?),
            name: row.get(2)?,
            kind: parse_kind(row, 3)?,
            path: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
