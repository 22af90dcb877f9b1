// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Amanogawa addon.
//!
//! Provides the error types, shared types, the [`MessagingBackend`] trait
//! implemented by transports, and the TTL cache used by the bridge and the
//! catalog client.

pub mod error;
pub mod traits;
pub mod ttl;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AmanogawaError, ResolveError};
pub use traits::{ChunkStream, MessagingBackend};
pub use ttl::TtlCache;
pub use types::{
    ChatMessage, EpisodeId, HealthStatus, MediaHandle, RemoteMedia, SentMessage, SessionState,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amanogawa_error_has_all_variants() {
        let _config = AmanogawaError::Config("test".into());
        let _channel = AmanogawaError::Channel {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _catalog = AmanogawaError::Catalog {
            message: "test".into(),
            source: None,
        };
        let _timeout = AmanogawaError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = AmanogawaError::Internal("test".into());
    }

    #[test]
    fn backend_trait_is_object_safe_per_media_type() {
        fn _assert_object_safe(_: &dyn MessagingBackend<Media = ()>) {}
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(unhealthy, healthy);
    }
}
