// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use amanogawa_bridge::Bridge;
use amanogawa_catalog::CatalogClient;
use amanogawa_core::{AmanogawaError, MessagingBackend};

use crate::handlers;
use crate::proxy;

/// Health state for the unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl HealthState {
    pub fn new(prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            prometheus_render,
        }
    }
}

/// Shared state for axum request handlers.
pub struct AppState<B: MessagingBackend> {
    /// Resolver and streaming bridge over the messaging backend.
    pub bridge: Bridge<B>,
    /// Upstream catalog API.
    pub catalog: Arc<CatalogClient>,
    /// Public URL of this addon, used in stream links.
    pub base_url: Arc<str>,
    /// Items per catalog page, for `skip` translation.
    pub page_size: u32,
    pub health: HealthState,
    /// Cancelled when the process begins shutting down; open proxy bodies end on it.
    pub shutdown: CancellationToken,
}

impl<B: MessagingBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            catalog: Arc::clone(&self.catalog),
            base_url: Arc::clone(&self.base_url),
            page_size: self.page_size,
            health: self.health.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

/// Gateway listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How long open connections may linger after shutdown begins.
    pub drain_timeout: Duration,
}

/// Default grace period for in-flight responses during shutdown.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the full router: addon resources, stream proxy, health and metrics.
pub fn router<B: MessagingBackend>(state: AppState<B>) -> Router {
    let addon_routes = Router::new()
        .route("/manifest.json", get(handlers::get_manifest::<B>))
        .route("/catalog/{type}/{file}", get(handlers::get_catalog::<B>))
        .route(
            "/catalog/{type}/{catalog_id}/{extra}",
            get(handlers::get_catalog_extra::<B>),
        )
        .route("/meta/{type}/{file}", get(handlers::get_meta::<B>))
        .route("/stream/{type}/{file}", get(handlers::get_streams::<B>))
        .with_state(state.clone());

    let proxy_routes = Router::new()
        .route("/stream-proxy/{content_id}", get(proxy::stream_proxy::<B>))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health::<B>))
        .route("/metrics", get(handlers::get_metrics::<B>))
        .with_state(state);

    Router::new()
        .merge(addon_routes)
        .merge(proxy_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `host:port` and serves until `state.shutdown` is cancelled.
pub async fn start_server<B: MessagingBackend>(
    config: &ServerConfig,
    state: AppState<B>,
) -> Result<(), AmanogawaError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AmanogawaError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");
    serve(listener, state, config.drain_timeout).await
}

/// Serves on an already bound listener until `state.shutdown` is cancelled.
///
/// Once shutdown begins, connections get `drain_timeout` to finish. Anything
/// still open after that is abandoned so the caller can move on to teardown.
pub async fn serve<B: MessagingBackend>(
    listener: TcpListener,
    state: AppState<B>,
    drain_timeout: Duration,
) -> Result<(), AmanogawaError> {
    let shutdown = state.shutdown.clone();
    let app = router(state);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    let drain_deadline = async {
        shutdown.cancelled().await;
        tokio::time::sleep(drain_timeout).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| AmanogawaError::Internal(format!("gateway server error: {e}")))?;
            tracing::info!("gateway stopped");
        }
        () = drain_deadline => {
            tracing::warn!(
                drain_timeout_ms = drain_timeout.as_millis() as u64,
                "connections still open after drain timeout, abandoning them"
            );
        }
    }
    Ok(())
}
