//! The shared SQLite pool behind the album and media-item tables.
//!
//! The server opens one pool at startup and hands clones to every handler;
//! `create-album` opens its own against the same file while the server may
//! be running, so file-backed connections wait on a busy database instead of
//! failing straight away.

use std::sync::atomic::{AtomicU64, Ordering};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rv_core::{Error, Result};

use crate::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;

pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Connections kept for the on-disk store. Requests hold one only for a
/// lookup or an insert, never across a body stream.
const FILE_POOL_SIZE: u32 = 8;

const MEMORY_POOL_SIZE: u32 = 4;

/// How long a writer waits on a locked database file, in milliseconds.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Open (creating if needed) the metadata database at `db_path` and bring
/// the `albums` / `media_items` schema up to date.
///
/// Every connection enforces the `media_items.album_id` cascade and uses
/// WAL so streaming reads are not blocked by upload inserts.
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
        ))
    });
    build_migrated(manager, FILE_POOL_SIZE)
}

/// A private in-memory store with the full schema, for tests.
///
/// Each call gets its own shared-cache database name, so connections in one
/// pool see the same rows while separate pools never do.
pub fn init_memory_pool() -> Result<DbPool> {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let uri = format!(
        "file:rv_memdb_{}_{}?mode=memory&cache=shared",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    );

    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    build_migrated(manager, MEMORY_POOL_SIZE)
}

fn build_migrated(manager: SqliteConnectionManager, max_size: u32) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to open metadata store: {e}")))?;

    migrations::run_migrations(&*get_conn(&pool)?)?;
    Ok(pool)
}

/// Check out a connection.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("No metadata connection available: {e}")))
}
