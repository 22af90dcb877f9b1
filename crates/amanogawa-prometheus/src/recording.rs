// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric descriptions.
//!
//! The bridge records these through the metrics-rs facade; describing them
//! here only adds help text and units for whichever recorder is installed.

use metrics::{Unit, describe_counter, describe_histogram};

/// Register all Amanogawa metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "amanogawa_cache_lookups_total",
        "Media handle cache lookups by outcome (hit, miss)"
    );
    describe_counter!(
        "amanogawa_resolutions_total",
        "Episode resolutions by outcome (resolved, channel_unavailable, timeout, not_found)"
    );
    describe_histogram!(
        "amanogawa_resolution_duration_seconds",
        Unit::Seconds,
        "Time from sending the deep-link command to the resolution outcome"
    );
    describe_counter!(
        "amanogawa_stream_bytes_total",
        Unit::Bytes,
        "Video bytes relayed to HTTP clients"
    );
}

#[cfg(test)]
mod tests {
    use metrics_exporter_prometheus::PrometheusBuilder;

    use super::*;

    #[test]
    fn described_metrics_render_with_help_text() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            register_metrics();
            metrics::counter!("amanogawa_stream_bytes_total").increment(2048);
            metrics::counter!("amanogawa_resolutions_total", "outcome" => "timeout").increment(1);
        });

        let text = handle.render();
        assert!(text.contains("# HELP amanogawa_stream_bytes_total"));
        assert!(text.contains("amanogawa_stream_bytes_total 2048"));
        assert!(text.contains(r#"amanogawa_resolutions_total{outcome="timeout"} 1"#));
    }
}
