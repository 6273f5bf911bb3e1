//! rv-db: the metadata store.
//!
//! SQLite-backed storage with connection pooling, embedded migrations,
//! typed models, and query modules for albums and media items. The pool is
//! created once per process and shared by every request handler.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
