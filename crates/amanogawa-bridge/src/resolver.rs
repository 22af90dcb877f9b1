// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correlation resolver: turns an episode id into a media handle by asking the
//! content bot for it and watching the conversation for the reply.
//!
//! The bot protocol has no request ids. A reply is recognised by a watermark
//! captured before the deep-link command goes out: the first incoming message
//! with media posted at or after the watermark is taken as the answer.
//! Telegram message dates have whole-second precision, so the watermark time
//! is floored to the second and, when the backend reports it, the id of the
//! sent command further excludes older messages from the same second.

use std::sync::Arc;
use std::time::Duration;

use amanogawa_config::model::ResolverConfig;
use amanogawa_core::{
    ChatMessage, EpisodeId, MediaHandle, MessagingBackend, RemoteMedia, ResolveError,
};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::cache::MediaCache;
use crate::session::ChannelSession;

/// Tunables of the correlation protocol.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Literal between `/start ` and the episode id.
    pub deep_link_marker: String,
    /// Time allowed for a qualifying reply to appear.
    pub timeout: Duration,
    /// Delay between history reads.
    pub poll_interval: Duration,
    /// Messages fetched per history read.
    pub history_window: usize,
    /// Lifetime of a cached handle.
    pub cache_ttl: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

impl ResolverSettings {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            deep_link_marker: config.deep_link_marker.clone(),
            timeout: config.timeout(),
            poll_interval: config.poll_interval(),
            history_window: config.history_window,
            cache_ttl: config.cache_ttl(),
        }
    }

    /// The text sent to the bot to request `episode_id`.
    pub fn command_for(&self, episode_id: EpisodeId) -> String {
        format!("/start {}{}", self.deep_link_marker, episode_id)
    }
}

/// Messages posted before this point cannot be the reply.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Watermark {
    pub(crate) date: DateTime<Utc>,
    pub(crate) after_id: Option<i64>,
}

impl Watermark {
    /// Captures the current time, floored to whole seconds.
    pub(crate) fn now() -> Self {
        let now = Utc::now();
        Self {
            date: now.duration_trunc(TimeDelta::seconds(1)).unwrap_or(now),
            after_id: None,
        }
    }

    fn excludes(&self, message_date: DateTime<Utc>, message_id: i64) -> bool {
        message_date < self.date || self.after_id.is_some_and(|id| message_id <= id)
    }
}

/// What one history read says about the pending request.
#[derive(Debug)]
pub(crate) enum Selection<'a, M> {
    Media(&'a ChatMessage<M>, &'a RemoteMedia<M>),
    TextOnly,
    Nothing,
}

/// Picks the reply from a newest-first history page.
///
/// Outgoing messages are skipped. The walk stops at the first message the
/// watermark excludes; of the remaining incoming messages the earliest one
/// with media wins.
pub(crate) fn select_reply<'a, M>(
    messages: &'a [ChatMessage<M>],
    watermark: &Watermark,
) -> Selection<'a, M> {
    let mut earliest = None;
    let mut saw_reply = false;
    for message in messages {
        if message.outgoing {
            continue;
        }
        if watermark.excludes(message.date, message.id) {
            break;
        }
        match &message.media {
            Some(media) => earliest = Some((message, media)),
            None => saw_reply = true,
        }
    }
    match earliest {
        Some((message, media)) => Selection::Media(message, media),
        None if saw_reply => Selection::TextOnly,
        None => Selection::Nothing,
    }
}

type Resolution<M> = Result<Arc<MediaHandle<M>>, ResolveError>;
type SharedResolution<M> = Shared<BoxFuture<'static, Resolution<M>>>;

struct Inner<B: MessagingBackend> {
    session: Arc<ChannelSession<B>>,
    cache: MediaCache<B::Media>,
    settings: ResolverSettings,
    inflight: DashMap<EpisodeId, SharedResolution<B::Media>>,
}

/// Resolves episode ids to media handles, with caching and per-id coalescing.
///
/// Concurrent calls for the same episode share one in-flight resolution that
/// runs on its own task, so a caller going away never cancels the others.
pub struct Resolver<B: MessagingBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: MessagingBackend> Clone for Resolver<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: MessagingBackend> Resolver<B> {
    pub fn new(session: Arc<ChannelSession<B>>, settings: ResolverSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                session,
                cache: MediaCache::new(settings.cache_ttl),
                settings,
                inflight: DashMap::new(),
            }),
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.inner.settings
    }

    pub fn cache(&self) -> &MediaCache<B::Media> {
        &self.inner.cache
    }

    /// Returns the cached handle for `episode_id`, or asks the bot for it.
    pub async fn resolve(&self, episode_id: EpisodeId) -> Resolution<B::Media> {
        if let Some(handle) = self.inner.cache.lookup(episode_id) {
            return Ok(handle);
        }

        let resolution = match self.inner.inflight.entry(episode_id) {
            Entry::Occupied(pending) => {
                debug!(%episode_id, "joining in-flight resolution");
                pending.get().clone()
            }
            Entry::Vacant(slot) => {
                let inner = Arc::clone(&self.inner);
                let resolution = async move {
                    let result = inner.resolve_uncached(episode_id).await;
                    inner.inflight.remove(&episode_id);
                    result
                }
                .boxed()
                .shared();
                slot.insert(resolution.clone());
                tokio::spawn(resolution.clone());
                resolution
            }
        };
        resolution.await
    }
}

impl<B: MessagingBackend> Inner<B> {
    async fn resolve_uncached(&self, episode_id: EpisodeId) -> Resolution<B::Media> {
        // Another resolution may have finished between the caller's lookup and now.
        if let Some(handle) = self.cache.peek(episode_id) {
            return Ok(handle);
        }

        let started = Instant::now();
        let result = self.correlate(episode_id).await;
        let elapsed = started.elapsed();

        let outcome = match &result {
            Ok(handle) => {
                self.cache.store(episode_id, Arc::clone(handle));
                info!(
                    %episode_id,
                    message_id = handle.message_id(),
                    size_bytes = ?handle.size_bytes(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "episode resolved"
                );
                "resolved"
            }
            Err(e) => {
                warn!(%episode_id, error = %e, elapsed_ms = elapsed.as_millis() as u64, "episode resolution failed");
                e.kind()
            }
        };
        metrics::counter!("amanogawa_resolutions_total", "outcome" => outcome).increment(1);
        metrics::histogram!("amanogawa_resolution_duration_seconds").record(elapsed.as_secs_f64());
        result
    }

    async fn correlate(&self, episode_id: EpisodeId) -> Resolution<B::Media> {
        let settings = &self.settings;
        let backend = self.session.acquire().await?;

        let mut watermark = Watermark::now();
        let deadline = Instant::now() + settings.timeout;

        let command = settings.command_for(episode_id);
        info!(%episode_id, bot_command = %command, "requesting episode from bot");
        let sent = backend.send_text(&command).await?;
        watermark.after_id = sent.id;

        let mut saw_text_reply = false;
        let mut polls = 0u32;
        loop {
            sleep_until((Instant::now() + settings.poll_interval).min(deadline)).await;
            polls += 1;

            // Acquire per poll so a connection lost mid-resolution is reopened.
            let poll = async {
                let backend = self.session.acquire().await?;
                Ok::<_, ResolveError>(backend.recent_messages(settings.history_window).await?)
            };
            match timeout_at(deadline, poll).await {
                Ok(Ok(messages)) => match select_reply(&messages, &watermark) {
                    Selection::Media(message, media) => {
                        debug!(%episode_id, message_id = message.id, polls, "found media reply");
                        return Ok(Arc::new(MediaHandle::new(
                            episode_id,
                            message.id,
                            media.clone(),
                        )));
                    }
                    Selection::TextOnly => saw_text_reply = true,
                    Selection::Nothing => {}
                },
                Ok(Err(e)) => warn!(%episode_id, error = %e, polls, "history poll failed, retrying"),
                Err(_) => debug!(%episode_id, polls, "history poll cut off by deadline"),
            }

            if Instant::now() >= deadline {
                break;
            }
        }

        if saw_text_reply {
            Err(ResolveError::NotFound)
        } else {
            Err(ResolveError::Timeout {
                after: settings.timeout,
            })
        }
    }
}
