use super::{MAX_REQUEST_SIZE_BYTES, SharedState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
};
use std::{path::PathBuf, time::Duration};
use tower_http::{
    cors::CorsLayer,
    services::ServeFile,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::Level;

/// Router settings that depend on the serving mode.
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Directory holding `index.html` for `GET /`.
    pub static_dir: PathBuf,
    /// Requests running longer are answered with 408.
    pub request_timeout: Option<Duration>,
}

pub fn create_app(state: SharedState, options: AppOptions) -> Router {
    // Configure the router with all endpoints
    let mut router = Router::new()
        // Static client page
        .route_service("/", ServeFile::new(options.static_dir.join("index.html")))
        // Scan API
        .route("/scan", post(handlers::scan))
        // Liveness probe
        .route("/health", get(handlers::health))
        // Apply a layer to limit the maximum size of request bodies
        .layer(DefaultBodyLimit::max(MAX_REQUEST_SIZE_BYTES));

    if let Some(timeout) = options.request_timeout {
        router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ));
    }

    router
        // Add CORS layer so the page can be served from another origin
        .layer(CorsLayer::permissive())
        // Add tracing for HTTP requests and responses
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)))
        // Provide the shared state
        .with_state(state)
}
