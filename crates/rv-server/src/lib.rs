//! rv-server: the HTTP surface of reelvault.
//!
//! - Range-request streaming of stored videos, photos, and album thumbnails
//! - Multipart uploads written through the streaming upload sink
//! - Request IDs, request tracing, body limits, and request timeouts
//! - Graceful shutdown on SIGINT/SIGTERM

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;

use rv_core::config::Config;
use rv_core::Error;
use rv_media::Ffmpeg;

use crate::context::AppContext;

/// Start the reelvault server and run until a shutdown signal arrives.
pub async fn start(config: Config) -> rv_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = rv_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    std::fs::create_dir_all(&config.storage.root)?;
    tracing::info!("Storage root: {}", config.storage.root.display());

    let ffmpeg = if config.upload.transcode_video {
        let found = Ffmpeg::discover(&config.tools);
        match &found {
            Some(f) => tracing::info!("ffmpeg found at {}; non-MP4 video will be transcoded", f.path().display()),
            None => tracing::warn!("ffmpeg not found; non-MP4 video will be stored as uploaded"),
        }
        found
    } else {
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(db, config, ffmpeg);
    let app = router::build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
