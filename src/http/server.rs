//! # HTTP Server
//!
//! Binds the router with its middleware stack (CORS, request tracing)
//! and runs it on tokio.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

use super::routes::{router, AppState};

/// CORS layer from the configured origin allowlist
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(tower_http::cors::Any)
}

/// Serve the API until the process is stopped
pub async fn serve(state: AppState) -> AppResult<()> {
    let config = state.config.clone();
    let app = router(state)
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("server error: {e}")))
}
