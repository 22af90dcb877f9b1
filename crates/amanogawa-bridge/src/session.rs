// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner of the single long-lived backend connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use amanogawa_core::{HealthStatus, MessagingBackend, ResolveError, SessionState};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Lazily connected, explicitly torn down session over one backend.
///
/// `acquire` connects on demand and reconnects if the backend reports a lost
/// connection. Connects are single-flight: callers that arrive while a connect
/// is in progress wait on the guard and re-check state instead of connecting
/// again.
pub struct ChannelSession<B> {
    backend: Arc<B>,
    connect_guard: Mutex<()>,
    torn_down: AtomicBool,
}

impl<B: MessagingBackend> ChannelSession<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            connect_guard: Mutex::new(()),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Returns the connected backend, connecting first if needed.
    pub async fn acquire(&self) -> Result<Arc<B>, ResolveError> {
        self.ensure_live()?;
        if self.backend.is_connected() {
            return Ok(Arc::clone(&self.backend));
        }

        let _guard = self.connect_guard.lock().await;
        self.ensure_live()?;
        if self.backend.is_connected() {
            return Ok(Arc::clone(&self.backend));
        }

        info!(backend = self.backend.name(), "connecting messaging backend");
        self.backend.connect().await.map_err(|e| {
            warn!(backend = self.backend.name(), error = %e, "backend connect failed");
            ResolveError::from(e)
        })?;
        info!(backend = self.backend.name(), "messaging backend connected");
        Ok(Arc::clone(&self.backend))
    }

    /// Disconnects the backend. Only the first call has any effect.
    ///
    /// Waits for an in-flight connect to settle so a connection opened
    /// concurrently is still closed.
    pub async fn teardown(&self) {
        let _guard = self.connect_guard.lock().await;
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if !self.backend.is_connected() {
            info!(backend = self.backend.name(), "session torn down (was not connected)");
            return;
        }
        match self.backend.disconnect().await {
            Ok(()) => info!(backend = self.backend.name(), "session torn down"),
            Err(e) => warn!(backend = self.backend.name(), error = %e, "backend disconnect failed"),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.torn_down.load(Ordering::SeqCst) {
            SessionState::TornDown
        } else if self.backend.is_connected() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// Health as seen from the HTTP layer. A lazily unconnected session is healthy.
    pub fn health(&self) -> HealthStatus {
        match self.state() {
            SessionState::Connected | SessionState::Disconnected => HealthStatus::Healthy,
            SessionState::TornDown => HealthStatus::Unhealthy("session torn down".into()),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn ensure_live(&self) -> Result<(), ResolveError> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Err(ResolveError::ChannelUnavailable(
                "session has been torn down".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use amanogawa_test_utils::MockBackend;

    use super::*;

    #[tokio::test]
    async fn acquire_connects_once_and_reuses() {
        let session = ChannelSession::new(Arc::new(MockBackend::new()));
        session.acquire().await.unwrap();
        session.acquire().await.unwrap();

        assert_eq!(session.backend().connect_calls(), 1);
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_acquires_connect_once() {
        let backend = Arc::new(MockBackend::new().with_connect_delay(Duration::from_millis(500)));
        let session = Arc::new(ChannelSession::new(Arc::clone(&backend)));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.acquire().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(backend.connect_calls(), 1);
    }

    #[tokio::test]
    async fn reconnects_after_connection_loss() {
        let session = ChannelSession::new(Arc::new(MockBackend::new()));
        session.acquire().await.unwrap();
        session.backend().drop_connection();
        assert_eq!(session.state(), SessionState::Disconnected);

        session.acquire().await.unwrap();
        assert_eq!(session.backend().connect_calls(), 2);
    }

    #[tokio::test]
    async fn connect_failure_is_channel_unavailable() {
        let backend = Arc::new(MockBackend::new());
        backend.set_fail_connect(true);
        let session = ChannelSession::new(backend);

        let err = session.acquire().await.unwrap_err();
        assert!(matches!(err, ResolveError::ChannelUnavailable(_)));
    }

    #[tokio::test]
    async fn teardown_without_connect_is_noop() {
        let session = ChannelSession::new(Arc::new(MockBackend::new()));
        session.teardown().await;

        assert_eq!(session.backend().disconnect_calls(), 0);
        assert_eq!(session.state(), SessionState::TornDown);
    }

    #[tokio::test]
    async fn teardown_disconnects_exactly_once() {
        let session = ChannelSession::new(Arc::new(MockBackend::new()));
        session.acquire().await.unwrap();

        session.teardown().await;
        session.teardown().await;

        assert_eq!(session.backend().disconnect_calls(), 1);
        assert!(matches!(session.health(), HealthStatus::Unhealthy(_)));
    }

    #[tokio::test]
    async fn acquire_after_teardown_fails() {
        let session = ChannelSession::new(Arc::new(MockBackend::new()));
        session.teardown().await;

        let err = session.acquire().await.unwrap_err();
        assert!(matches!(err, ResolveError::ChannelUnavailable(_)));
        assert_eq!(session.backend().connect_calls(), 0);
    }
}
