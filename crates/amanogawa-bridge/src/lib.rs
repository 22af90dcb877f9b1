// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media acquisition and range-streaming bridge.
//!
//! Given an episode id, the bridge asks the content bot for the video over
//! the messaging backend, correlates the bot's reply, caches the resulting
//! [`MediaHandle`], and serves its bytes from an arbitrary offset even though
//! the backend downloads in fixed-size chunks.
//!
//! # Components
//!
//! - [`MediaCache`] - TTL cache of resolved handles
//! - [`ChannelSession`] - lazily connected, single-flight backend session
//! - [`Resolver`] - deep-link command plus history polling, coalesced per id
//! - [`chunk`] - byte offset to chunk translation and trimmed byte streams

pub mod cache;
pub mod chunk;
pub mod resolver;
pub mod session;

use std::sync::Arc;

use amanogawa_core::{EpisodeId, HealthStatus, MediaHandle, MessagingBackend, ResolveError};

pub use cache::MediaCache;
pub use chunk::{plan, ByteStream, ChunkPlan};
pub use resolver::{Resolver, ResolverSettings};
pub use session::ChannelSession;

/// Session, resolver and chunk adapter behind one cloneable handle.
pub struct Bridge<B: MessagingBackend> {
    session: Arc<ChannelSession<B>>,
    resolver: Resolver<B>,
}

impl<B: MessagingBackend> Clone for Bridge<B> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            resolver: self.resolver.clone(),
        }
    }
}

impl<B: MessagingBackend> Bridge<B> {
    pub fn new(backend: Arc<B>, settings: ResolverSettings) -> Self {
        let session = Arc::new(ChannelSession::new(backend));
        let resolver = Resolver::new(Arc::clone(&session), settings);
        Self { session, resolver }
    }

    /// Resolve `episode_id` to a media handle, from cache when possible.
    pub async fn resolve(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Arc<MediaHandle<B::Media>>, ResolveError> {
        self.resolver.resolve(episode_id).await
    }

    /// Open a byte stream over `handle` starting at `offset`.
    pub async fn open_stream(
        &self,
        handle: &MediaHandle<B::Media>,
        offset: u64,
    ) -> Result<ByteStream, ResolveError> {
        let backend = self.session.acquire().await?;
        chunk::open(backend.as_ref(), handle, offset).await
    }

    /// Disconnect the backend. Safe to call more than once.
    pub async fn teardown(&self) {
        self.session.teardown().await;
    }

    pub fn health(&self) -> HealthStatus {
        self.session.health()
    }

    pub fn session(&self) -> &Arc<ChannelSession<B>> {
        &self.session
    }

    pub fn resolver(&self) -> &Resolver<B> {
        &self.resolver
    }
}
