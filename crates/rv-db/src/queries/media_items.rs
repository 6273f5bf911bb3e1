//! Media item CRUD operations.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use rv_core::{AlbumId, Error, MediaId, MediaKind, Result};

use crate::models::MediaItem;

const COLS: &str = "id, album_id, name, kind, path, created_at";

/// Record a stored media file.
pub fn create_media_item(
    conn: &Connection,
    album_id: AlbumId,
    name: &str,
    kind: MediaKind,
    path: &str,
) -> Result<MediaItem> {
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO media_items (album_id, name, kind, path, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![album_id.get(), name, kind.to_string(), path, created_at],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(MediaItem {
        id: MediaId::from(conn.last_insert_rowid()),
        album_id,
        name: name.to_string(),
        kind,
        path: path.to_string(),
        created_at,
    })
}

/// Get a media item by ID.
pub fn get_media_item(conn: &Connection, id: MediaId) -> Result<Option<MediaItem>> {
    conn.query_row(
        &format!("SELECT {COLS} FROM media_items WHERE id = ?1"),
        [id.get()],
        MediaItem::from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List the media items of an album, oldest first.
pub fn list_for_album(conn: &Connection, album_id: AlbumId) -> Result<Vec<MediaItem>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COLS} FROM media_items WHERE album_id = ?1 ORDER BY id"
        ))
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([album_id.get()], MediaItem::from_row)
        .map_err(|e| Error::database(e.to_string()))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Delete a media item row. Returns `true` if it existed.
pub fn delete_media_item(conn: &Connection, id: MediaId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM media_items WHERE id = ?1", [id.get()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::albums;

    #[test]
    fn media_item_crud() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let album = albums::create_album(&conn, "Trips", Some("Trips")).unwrap();

        let item = create_media_item(
            &conn,
            album.id,
            "beach",
            MediaKind::Photo,
            "Trips/photo_1700000000000.webp",
        )
        .unwrap();

        let fetched = get_media_item(&conn, item.id).unwrap().unwrap();
        assert_eq!(fetched.kind, MediaKind::Photo);
        assert_eq!(fetched.album_id, album.id);
        assert_eq!(fetched.path, "Trips/photo_1700000000000.webp");

        assert!(delete_media_item(&conn, item.id).unwrap());
        assert!(get_media_item(&conn, item.id).unwrap().is_none());
        assert!(!delete_media_item(&conn, item.id).unwrap());
    }

    #[test]
    fn list_is_scoped_to_album() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let a = albums::create_album(&conn, "A", Some("A")).unwrap();
        let b = albums::create_album(&conn, "B", Some("B")).unwrap();

        create_media_item(&conn, a.id, "1", MediaKind::Video, "A/video_1.mp4").unwrap();
        create_media_item(&conn, a.id, "2", MediaKind::Photo, "A/photo_2.webp").unwrap();
        create_media_item(&conn, b.id, "3", MediaKind::Video, "B/video_3.mp4").unwrap();

        let items = list_for_album(&conn, a.id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "1");
        assert_eq!(items[1].name, "2");
    }

    #[test]
    fn unknown_album_violates_foreign_key() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let res = create_media_item(&conn, AlbumId::from(77), "x", MediaKind::Video, "x/y.mp4");
        assert!(matches!(res, Err(Error::Database { .. })));
    }
}
