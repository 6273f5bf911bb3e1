//! Shared test harness for integration tests.
//!
//! [`TestHarness`] builds an in-memory DB, a temporary storage root, and a
//! full [`AppContext`]. [`TestHarness::with_server`] additionally starts Axum
//! on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use rv_core::config::Config;
use rv_core::{AlbumId, MediaKind};
use rv_db::models::{Album, MediaItem};
use rv_db::pool::{init_memory_pool, DbPool, PooledConnection};
use rv_db::queries::{albums, media_items};
use rv_media::Storage;
use rv_server::context::AppContext;
use rv_server::router::build_router;
use tempfile::TempDir;

pub const MIB: usize = 1024 * 1024;

pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub storage: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// The storage root is always replaced by a fresh temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let storage = tempfile::tempdir().expect("failed to create storage dir");
        config.storage.root = storage.path().to_path_buf();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(db.clone(), config, None);

        Self { ctx, db, storage }
    }

    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    pub fn conn(&self) -> PooledConnection {
        rv_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    pub fn create_album(&self, title: &str) -> Album {
        albums::create_album(&self.conn(), title, Some(title)).expect("failed to create album")
    }

    /// Insert an album row with a fixed id, as an admin tool would.
    pub fn insert_album_with_id(&self, id: i64, title: &str) -> Album {
        self.conn()
            .execute(
                "INSERT INTO albums (id, title, folder, created_at) VALUES (?1, ?2, ?2, datetime('now'))",
                rusqlite::params![id, title],
            )
            .expect("failed to insert album");
        albums::get_album(&self.conn(), AlbumId::from(id))
            .unwrap()
            .expect("album just inserted")
    }

    /// Write `data` into the album folder and register it as a media item.
    pub fn seed_media(&self, album: &Album, file_name: &str, kind: MediaKind, data: &[u8]) -> MediaItem {
        let dir = self.storage.path().join(&album.folder);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file_name), data).unwrap();

        let reference = Storage::reference_for(&album.folder, file_name);
        media_items::create_media_item(&self.conn(), album.id, file_name, kind, &reference)
            .expect("failed to create media item")
    }

    pub fn stored_path(&self, reference: &str) -> PathBuf {
        self.ctx.storage.resolve(reference).expect("bad reference")
    }

    /// Every regular file under the storage root.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let mut stack = vec![self.storage.path().to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    out.push(path);
                }
            }
        }
        out
    }

    pub fn media_count(&self) -> i64 {
        self.conn()
            .query_row("SELECT COUNT(*) FROM media_items", [], |row| row.get(0))
            .unwrap()
    }
}

/// Deterministic payload of `len` bytes where neighbouring windows differ.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 251) % 256) as u8).collect()
}
