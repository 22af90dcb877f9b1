// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! SIGTERM and SIGINT (Ctrl+C) cancel a [`CancellationToken`] that the HTTP
//! server watches. Once the server has stopped, the messaging session is torn
//! down before the process exits. A second signal exits immediately.

use std::future::Future;
use std::time::Duration;

use amanogawa_bridge::Bridge;
use amanogawa_core::{AmanogawaError, MessagingBackend};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on how long session teardown may hold up process exit.
pub const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Exit status for a forced exit on a repeated signal.
const FORCED_EXIT_CODE: i32 = 130;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received. The handler keeps listening afterwards and exits the process on
/// a second signal.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            signal = wait_for_signal() => info!(signal, "shutdown signal received, initiating shutdown"),
            _ = token_clone.cancelled() => return,
        }
        token_clone.cancel();
        debug!("shutdown started, listening for a second signal");

        let signal = wait_for_signal().await;
        warn!(signal, "second signal received, exiting without teardown");
        std::process::exit(FORCED_EXIT_CODE);
    });

    token
}

/// Resolves with the signal's name once SIGINT or SIGTERM arrives.
async fn wait_for_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                () = ctrl_c() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            },
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
                ctrl_c().await;
                "SIGINT"
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        "Ctrl+C"
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
}

/// Runs the gateway to completion, then tears the session down whatever the outcome.
pub async fn serve_then_teardown<B, F>(
    server: F,
    bridge: &Bridge<B>,
    teardown_timeout: Duration,
) -> Result<(), AmanogawaError>
where
    B: MessagingBackend,
    F: Future<Output = Result<(), AmanogawaError>>,
{
    let result = server.await;
    if let Err(e) = &result {
        warn!(error = %e, "gateway exited with an error");
    }
    teardown_session(bridge, teardown_timeout).await;
    result
}

/// Tears down the messaging session, giving up after `timeout`.
pub async fn teardown_session<B: MessagingBackend>(bridge: &Bridge<B>, timeout: Duration) {
    match tokio::time::timeout(timeout, bridge.teardown()).await {
        Ok(()) => info!("messaging session closed"),
        Err(_) => warn!(
            timeout_secs = timeout.as_secs(),
            "session teardown timed out, exiting anyway"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use amanogawa_bridge::ResolverSettings;
    use amanogawa_catalog::CatalogClient;
    use amanogawa_config::model::CatalogConfig;
    use amanogawa_core::SessionState;
    use amanogawa_gateway::{AppState, HealthState};
    use amanogawa_test_utils::{MockBackend, Reply, patterned_bytes};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        // Cancelling also stops the background task.
        token.cancel();
    }

    #[tokio::test]
    async fn teardown_disconnects_connected_session() {
        let backend = Arc::new(MockBackend::new());
        let bridge = Bridge::new(Arc::clone(&backend), ResolverSettings::default());
        bridge.session().acquire().await.unwrap();

        teardown_session(&bridge, TEARDOWN_TIMEOUT).await;

        assert_eq!(backend.disconnect_calls(), 1);
        assert_eq!(bridge.session().state(), SessionState::TornDown);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_gives_up_after_timeout() {
        let backend = Arc::new(MockBackend::new().with_connect_delay(Duration::from_secs(60)));
        let bridge = Bridge::new(Arc::clone(&backend), ResolverSettings::default());

        // A connect in progress holds the guard that teardown waits on.
        let connecting = {
            let bridge = bridge.clone();
            tokio::spawn(async move { bridge.session().acquire().await })
        };
        tokio::task::yield_now().await;

        let started = tokio::time::Instant::now();
        teardown_session(&bridge, Duration::from_secs(2)).await;
        assert_eq!(started.elapsed(), Duration::from_secs(2));

        connecting.abort();
    }

    #[tokio::test]
    async fn failed_server_still_tears_down() {
        let backend = Arc::new(MockBackend::new());
        let bridge = Bridge::new(Arc::clone(&backend), ResolverSettings::default());
        bridge.session().acquire().await.unwrap();

        let result = serve_then_teardown(
            async { Err(AmanogawaError::Internal("bind failed".to_string())) },
            &bridge,
            TEARDOWN_TIMEOUT,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(bridge.session().state(), SessionState::TornDown);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_with_stalled_stream_still_tears_down() {
        let backend = Arc::new(MockBackend::new());
        backend
            .script_reply(Reply::video(patterned_bytes(64 * 1024 * 1024)))
            .await;
        let settings = ResolverSettings {
            poll_interval: Duration::from_millis(10),
            ..ResolverSettings::default()
        };
        let bridge = Bridge::new(Arc::clone(&backend), settings);
        let state = AppState {
            bridge: bridge.clone(),
            catalog: Arc::new(CatalogClient::new(&CatalogConfig::default()).unwrap()),
            base_url: "http://addon.test".into(),
            page_size: 10,
            health: HealthState::new(None),
            shutdown: CancellationToken::new(),
        };
        let shutdown = state.shutdown.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = {
            let bridge = bridge.clone();
            tokio::spawn(async move {
                let serving =
                    amanogawa_gateway::serve(listener, state, Duration::from_millis(500));
                serve_then_teardown(serving, &bridge, TEARDOWN_TIMEOUT).await
            })
        };

        // Read the start of the response, then stop reading like a paused player.
        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /stream-proxy/1 HTTP/1.1\r\nHost: addon.test\r\n\r\n")
            .await
            .unwrap();
        let mut head = vec![0u8; 4096];
        client.read_exact(&mut head).await.unwrap();
        assert!(head.starts_with(b"HTTP/1.1 200"));

        shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(10), server)
            .await
            .expect("server returned after shutdown")
            .unwrap();

        assert!(result.is_ok());
        assert_eq!(bridge.session().state(), SessionState::TornDown);
        assert_eq!(backend.disconnect_calls(), 1);
        drop(client);
    }
}
