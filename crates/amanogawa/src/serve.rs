// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `amanogawa serve`: wires the catalog client, Telegram backend, bridge and
//! gateway together and runs until a shutdown signal arrives.

use std::sync::Arc;

use amanogawa_bridge::{Bridge, ResolverSettings};
use amanogawa_catalog::CatalogClient;
use amanogawa_config::AmanogawaConfig;
use amanogawa_core::AmanogawaError;
use amanogawa_gateway::{AppState, HealthState, ServerConfig, DRAIN_TIMEOUT};
use amanogawa_telegram::TelegramBackend;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the addon server until SIGINT/SIGTERM, then tears the session down.
///
/// Teardown runs whether the server stopped cleanly, failed, or had to
/// abandon connections after the drain timeout.
pub async fn run_serve(config: AmanogawaConfig) -> Result<(), AmanogawaError> {
    init_tracing(&config.server.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting amanogawa");

    let prometheus_render = init_prometheus(&config)?;

    let catalog = Arc::new(CatalogClient::new(&config.catalog)?);
    let backend = Arc::new(TelegramBackend::new(config.telegram.clone())?);
    let bridge = Bridge::new(backend, ResolverSettings::from_config(&config.resolver));

    // Connect early so an unauthorized session shows up in the logs at startup.
    // Requests still reconnect on demand if this fails.
    {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            if let Err(e) = bridge.session().acquire().await {
                warn!(error = %e, "telegram session not ready; will retry on first stream request");
            }
        });
    }

    let cancel = shutdown::install_signal_handler();
    let state = AppState {
        bridge: bridge.clone(),
        catalog,
        base_url: config.server.base_url.trim_end_matches('/').into(),
        page_size: config.catalog.page_size,
        health: HealthState::new(prometheus_render),
        shutdown: cancel.clone(),
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        drain_timeout: DRAIN_TIMEOUT,
    };
    info!(base_url = %config.server.base_url, "addon manifest at {}/manifest.json", state.base_url);

    let result = shutdown::serve_then_teardown(
        amanogawa_gateway::start_server(&server_config, state),
        &bridge,
        shutdown::TEARDOWN_TIMEOUT,
    )
    .await;
    cancel.cancel();
    info!("amanogawa stopped");
    result
}

#[cfg(feature = "prometheus")]
fn init_prometheus(
    config: &AmanogawaConfig,
) -> Result<Option<Arc<dyn Fn() -> String + Send + Sync>>, AmanogawaError> {
    if !config.prometheus.enabled {
        return Ok(None);
    }
    let exporter = amanogawa_prometheus::PrometheusExporter::install()?;
    Ok(Some(exporter.render_fn()))
}

#[cfg(not(feature = "prometheus"))]
fn init_prometheus(
    config: &AmanogawaConfig,
) -> Result<Option<Arc<dyn Fn() -> String + Send + Sync>>, AmanogawaError> {
    if config.prometheus.enabled {
        warn!("prometheus.enabled is set but this build has no prometheus support");
    }
    Ok(None)
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("amanogawa={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
