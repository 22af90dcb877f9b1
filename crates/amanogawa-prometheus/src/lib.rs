// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus exporter for the Amanogawa addon.
//!
//! Components record through the metrics-rs facade; this crate installs the
//! Prometheus recorder and renders the text format served at `/metrics`.

pub mod recording;

use std::sync::Arc;

use amanogawa_core::AmanogawaError;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub use recording::register_metrics;

/// Installed Prometheus recorder.
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    /// Installs the Prometheus recorder globally and describes every metric.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn install() -> Result<Self, AmanogawaError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            AmanogawaError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// A shareable render callback for the gateway's `/metrics` route.
    pub fn render_fn(&self) -> Arc<dyn Fn() -> String + Send + Sync> {
        let handle = self.handle.clone();
        Arc::new(move || handle.render())
    }
}
