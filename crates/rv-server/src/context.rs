//! Application context shared across route handlers via Axum state.

use std::sync::Arc;

use rv_core::config::Config;
use rv_db::pool::DbPool;
use rv_media::{Ffmpeg, Storage, UploadSink};

/// Everything a handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub storage: Storage,
    pub uploads: Arc<UploadSink>,
}

impl AppContext {
    /// Build the context. Transcoding is bounded by the request timeout so a
    /// stuck ffmpeg never outlives its request.
    pub fn new(db: DbPool, config: Config, ffmpeg: Option<Ffmpeg>) -> Self {
        let storage = Storage::new(config.storage.root.clone());
        let ffmpeg = ffmpeg.map(|f| f.with_timeout(config.server.request_timeout()));
        let uploads = UploadSink::new(storage.clone(), config.upload.clone()).with_ffmpeg(ffmpeg);

        Self {
            db,
            config: Arc::new(config),
            storage,
            uploads: Arc::new(uploads),
        }
    }
}
