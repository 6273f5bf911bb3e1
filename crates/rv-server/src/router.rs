//! Axum router construction.

use std::convert::Infallible;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    // uploads bypass the default 2 MB extractor limit and get the configured one
    let upload_limit = ctx.config.server.max_upload_bytes;
    let media = post(routes::media::upload_media)
        .delete(routes::media::delete_media)
        .layer::<_, Infallible>(DefaultBodyLimit::disable())
        .layer::<_, Infallible>(RequestBodyLimitLayer::new(upload_limit));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/albums", get(routes::albums::list_albums))
        .route("/media", media)
        .route("/media/stream/{id}", get(routes::stream::stream_media))
        .route("/media/thumb/{album_id}", get(routes::stream::album_thumbnail))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            ctx.config.server.request_timeout(),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
