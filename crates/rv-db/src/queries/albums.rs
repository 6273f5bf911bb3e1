//! Album CRUD operations.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use rv_core::{AlbumId, Error, Result};

use crate::models::Album;

const COLS: &str = "id, title, folder, thumbnail_path, created_at";

/// Create a new album.
///
/// When `folder` is `None` the album is stored under `album_<id>`, which is
/// only known once the row exists.
pub fn create_album(conn: &Connection, title: &str, folder: Option<&str>) -> Result<Album> {
    let created_at = Utc::now().to_rfc3339();

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "INSERT INTO albums (title, folder, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![title, folder.unwrap_or(""), created_at],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let id = AlbumId::from(tx.last_insert_rowid());
    let folder = match folder {
        Some(f) => f.to_string(),
        None => {
            let f = format!("album_{id}");
            tx.execute(
                "UPDATE albums SET folder = ?1 WHERE id = ?2",
                rusqlite::params![f, id.get()],
            )
            .map_err(|e| Error::database(e.to_string()))?;
            f
        }
    };

    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    Ok(Album {
        id,
        title: title.to_string(),
        folder,
        thumbnail_path: None,
        created_at,
    })
}

/// Get an album by ID.
pub fn get_album(conn: &Connection, id: AlbumId) -> Result<Option<Album>> {
    conn.query_row(
        &format!("SELECT {COLS} FROM albums WHERE id = ?1"),
        [id.get()],
        Album::from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List all albums, newest first.
pub fn list_albums(conn: &Connection) -> Result<Vec<Album>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COLS} FROM albums ORDER BY created_at DESC, id DESC"
        ))
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Album::from_row)
        .map_err(|e| Error::database(e.to_string()))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Record the album's thumbnail path. Returns `true` if the album existed.
pub fn set_thumbnail(conn: &Connection, id: AlbumId, thumbnail_path: &str) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE albums SET thumbnail_path = ?1 WHERE id = ?2",
            rusqlite::params![thumbnail_path, id.get()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete an album and, by cascade, its media rows. Returns `true` if deleted.
pub fn delete_album(conn: &Connection, id: AlbumId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM albums WHERE id = ?1", [id.get()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
