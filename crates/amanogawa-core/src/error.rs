// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Amanogawa addon.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across backend traits, clients and core operations.
#[derive(Debug, Error)]
pub enum AmanogawaError {
    /// Configuration errors (missing credentials, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Messaging backend errors (connection failure, send/receive failure, download failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Catalog API errors (HTTP failure, unexpected status, malformed payload).
    #[error("catalog error: {message}")]
    Catalog {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AmanogawaError {
    /// Shorthand for a [`AmanogawaError::Channel`] without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }
}

/// Failure outcome of resolving an episode to a media handle.
///
/// Cloneable so a single in-flight resolution can hand the same outcome to
/// every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The messaging backend could not be reached or the command could not be sent.
    #[error("channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// No qualifying reply arrived before the deadline.
    #[error("no reply with media within {after:?}")]
    Timeout { after: Duration },

    /// The bot answered, but never with a media payload.
    #[error("bot replied without media")]
    NotFound,
}

impl From<AmanogawaError> for ResolveError {
    fn from(err: AmanogawaError) -> Self {
        match err {
            AmanogawaError::Timeout { duration } => ResolveError::Timeout { after: duration },
            other => ResolveError::ChannelUnavailable(other.to_string()),
        }
    }
}

impl ResolveError {
    /// Short label used for logs and metric dimensions.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::ChannelUnavailable(_) => "channel_unavailable",
            ResolveError::Timeout { .. } => "timeout",
            ResolveError::NotFound => "not_found",
        }
    }
}
