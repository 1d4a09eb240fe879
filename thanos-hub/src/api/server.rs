//! HTTP server setup and routing

use crate::controller::Controller;
use crate::error::{Error, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use thanos_common::config::HttpConfig;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub controller: Arc<Controller>,
}

/// Build the router with all routes attached
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Dashboard
        .route("/", get(super::ui::dashboard))
        .route("/health", get(super::handlers::health))
        .route("/api/status", get(super::handlers::status))
        .route("/api/control", post(super::handlers::control))
        .route("/api/clap_test", post(super::handlers::clap_test))
        .route("/api/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Dashboard may be opened from another host on the LAN
        .layer(CorsLayer::permissive())
}

/// Serve until `cancel` fires, then drain in-flight requests
pub async fn run(config: &HttpConfig, ctx: AppContext, cancel: CancellationToken) -> Result<()> {
    let addr = format!("{}:{}", config.bind_address, config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(ctx))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
