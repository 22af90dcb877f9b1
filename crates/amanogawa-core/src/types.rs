// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the bridge, the backends and the gateway.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::time::Instant;

/// External episode identifier understood by the content bot (`bot_id` in the catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpisodeId(pub i64);

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Health status reported by the backend session and the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Not operational.
    Unhealthy(String),
}

/// Connection state of the backend session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// Never connected, or found disconnected.
    Disconnected,
    /// Connected and usable.
    Connected,
    /// Torn down during shutdown; will not reconnect.
    TornDown,
}

/// A media payload attached to a chat message.
#[derive(Debug, Clone)]
pub struct RemoteMedia<M> {
    /// Backend-specific reference needed to download the media.
    pub inner: M,
    /// Total size in bytes, if the backend reports it.
    pub size_bytes: Option<u64>,
    /// MIME type, if the backend reports it.
    pub mime_type: Option<String>,
}

/// A message from the conversation with the content bot.
#[derive(Debug, Clone)]
pub struct ChatMessage<M> {
    /// Backend message id; monotonically increasing within one conversation.
    pub id: i64,
    /// When the message was posted.
    pub date: DateTime<Utc>,
    /// Whether this client authored the message.
    pub outgoing: bool,
    /// Video or document payload. Other kinds of media are reported as `None`.
    pub media: Option<RemoteMedia<M>>,
}

/// Receipt for a message sent to the content bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    /// Message id assigned by the backend, when it reports one.
    pub id: Option<i64>,
}

/// An immutable, resolved reference to a remote video.
///
/// Handles are shared through `Arc` by the cache and every stream that serves
/// them. Re-resolving an episode produces a new handle.
#[derive(Debug)]
pub struct MediaHandle<M> {
    episode_id: EpisodeId,
    message_id: i64,
    media: M,
    size_bytes: Option<u64>,
    mime_type: Option<String>,
    resolved_at: Instant,
}

impl<M> MediaHandle<M> {
    /// Builds a handle from the reply message that carried the media.
    pub fn new(episode_id: EpisodeId, message_id: i64, media: RemoteMedia<M>) -> Self {
        Self {
            episode_id,
            message_id,
            media: media.inner,
            // A reported size of zero means the backend does not know it.
            size_bytes: media.size_bytes.filter(|size| *size > 0),
            mime_type: media.mime_type,
            resolved_at: Instant::now(),
        }
    }

    pub fn episode_id(&self) -> EpisodeId {
        self.episode_id
    }

    pub fn message_id(&self) -> i64 {
        self.message_id
    }

    /// Backend reference used to open the chunk stream.
    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size_bytes
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn resolved_at(&self) -> Instant {
        self.resolved_at
    }
}
