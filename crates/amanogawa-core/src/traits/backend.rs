// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging backend trait for the conversation with the content bot.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::AmanogawaError;
use crate::types::{ChatMessage, SentMessage};

/// A stream of fixed-size media chunks. Only the final chunk may be shorter.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, AmanogawaError>>;

/// A single logged-in account talking to one content bot.
///
/// Implementations multiplex concurrent calls over one physical connection,
/// so every method takes `&self`. Connection lifecycle is driven by the
/// session manager in `amanogawa-bridge`; other callers never connect directly.
#[async_trait]
pub trait MessagingBackend: Send + Sync + 'static {
    /// Backend reference to a downloadable media payload.
    type Media: Clone + Send + Sync + 'static;

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Granularity at which [`MessagingBackend::stream_chunks`] can seek.
    fn chunk_size(&self) -> u64;

    /// Whether the underlying connection is currently usable.
    fn is_connected(&self) -> bool;

    /// Establishes the connection. Called only while disconnected.
    async fn connect(&self) -> Result<(), AmanogawaError>;

    /// Closes the connection, persisting any session state.
    async fn disconnect(&self) -> Result<(), AmanogawaError>;

    /// Sends a text message to the content bot.
    async fn send_text(&self, text: &str) -> Result<SentMessage, AmanogawaError>;

    /// Returns up to `limit` of the most recent messages in the bot conversation,
    /// newest first.
    async fn recent_messages(
        &self,
        limit: usize,
    ) -> Result<Vec<ChatMessage<Self::Media>>, AmanogawaError>;

    /// Opens a chunk stream over `media` starting at chunk `first_chunk`.
    async fn stream_chunks(
        &self,
        media: &Self::Media,
        first_chunk: u64,
    ) -> Result<ChunkStream, AmanogawaError>;
}
