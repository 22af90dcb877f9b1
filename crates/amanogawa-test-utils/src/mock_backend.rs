// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging backend for deterministic testing.
//!
//! `MockBackend` implements `MessagingBackend` with a scripted content bot:
//! every command sent through `send_text()` pops the next scripted exchange,
//! whose replies become visible in the history after a configurable number of
//! polls. Media payloads are in-memory byte buffers served in fixed-size chunks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use amanogawa_core::types::{ChatMessage, RemoteMedia, SentMessage};
use amanogawa_core::{AmanogawaError, ChunkStream, MessagingBackend};

/// Chunk size used when none is configured: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Media payload held by the mock: the id of the carrying message and its bytes.
#[derive(Debug, Clone)]
pub struct MockMedia {
    pub message_id: i64,
    pub content: Arc<Vec<u8>>,
}

/// What the scripted bot posts.
#[derive(Debug, Clone)]
enum ReplyBody {
    Video {
        content: Arc<Vec<u8>>,
        report_size: bool,
    },
    Text,
}

/// A single scripted bot message.
#[derive(Debug, Clone)]
pub struct Reply {
    body: ReplyBody,
    hidden_polls: usize,
}

impl Reply {
    /// A video reply whose size is reported to the client.
    pub fn video(content: Vec<u8>) -> Self {
        Self {
            body: ReplyBody::Video {
                content: Arc::new(content),
                report_size: true,
            },
            hidden_polls: 0,
        }
    }

    /// A video reply whose size the backend does not report.
    pub fn video_unknown_size(content: Vec<u8>) -> Self {
        Self {
            body: ReplyBody::Video {
                content: Arc::new(content),
                report_size: false,
            },
            hidden_polls: 0,
        }
    }

    /// A plain text reply without media.
    pub fn text() -> Self {
        Self {
            body: ReplyBody::Text,
            hidden_polls: 0,
        }
    }

    /// Keep the reply out of the history for the first `polls` history reads.
    pub fn after_polls(mut self, polls: usize) -> Self {
        self.hidden_polls = polls;
        self
    }
}

#[derive(Debug)]
struct State {
    next_id: i64,
    /// Oldest first.
    history: Vec<ChatMessage<MockMedia>>,
    sent: Vec<String>,
    exchanges: VecDeque<Vec<Reply>>,
    pending: Vec<Reply>,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn post(&mut self, body: ReplyBody, date: DateTime<Utc>) -> i64 {
        let id = self.allocate_id();
        let media = match body {
            ReplyBody::Video {
                content,
                report_size,
            } => Some(RemoteMedia {
                size_bytes: report_size.then_some(content.len() as u64),
                mime_type: Some("video/mp4".to_string()),
                inner: MockMedia {
                    message_id: id,
                    content,
                },
            }),
            ReplyBody::Text => None,
        };
        self.history.push(ChatMessage {
            id,
            date,
            outgoing: false,
            media,
        });
        id
    }
}

/// A scripted stand-in for the Telegram user session.
#[derive(Debug)]
pub struct MockBackend {
    chunk_size: u64,
    connect_delay: Duration,
    connected: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    fail_connect: AtomicBool,
    fail_send: AtomicBool,
    failing_polls: AtomicUsize,
    drop_on_poll: AtomicBool,
    poll_calls: AtomicUsize,
    chunk_fail_after: Option<usize>,
    chunks_served: Arc<AtomicUsize>,
    state: Mutex<State>,
}

impl MockBackend {
    /// Create a disconnected mock with an empty conversation.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_delay: Duration::ZERO,
            connected: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            fail_connect: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            failing_polls: AtomicUsize::new(0),
            drop_on_poll: AtomicBool::new(false),
            poll_calls: AtomicUsize::new(0),
            chunk_fail_after: None,
            chunks_served: Arc::new(AtomicUsize::new(0)),
            state: Mutex::new(State {
                next_id: 1,
                history: Vec::new(),
                sent: Vec::new(),
                exchanges: VecDeque::new(),
                pending: Vec::new(),
            }),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Make every `connect()` take `delay` before succeeding.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Fail chunk streams with a transport error after `chunks` chunks.
    pub fn with_chunk_failure_after(mut self, chunks: usize) -> Self {
        self.chunk_fail_after = Some(chunks);
        self
    }

    /// Script the bot's answer to the next command as a single reply.
    pub async fn script_reply(&self, reply: Reply) {
        self.script_exchange(vec![reply]).await;
    }

    /// Script the bot's answer to the next command as several replies.
    pub async fn script_exchange(&self, replies: Vec<Reply>) {
        self.state.lock().await.exchanges.push_back(replies);
    }

    /// Post a bot message dated `date` directly into the history.
    ///
    /// Returns the message id it was given.
    pub async fn push_history(&self, reply: Reply, date: DateTime<Utc>) -> i64 {
        self.state.lock().await.post(reply.body, date)
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    /// Make the next `polls` history reads fail.
    pub fn fail_next_polls(&self, polls: usize) {
        self.failing_polls.store(polls, Ordering::SeqCst);
    }

    /// Make the next history read fail because the connection dropped.
    pub fn drop_connection_on_next_poll(&self) {
        self.drop_on_poll.store(true, Ordering::SeqCst);
    }

    /// Simulate the connection dropping underneath the session.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Commands sent through `send_text()`, in order.
    pub async fn sent_commands(&self) -> Vec<String> {
        self.state.lock().await.sent.clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    /// Chunks handed out across every stream so far.
    pub fn chunks_served(&self) -> usize {
        self.chunks_served.load(Ordering::SeqCst)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingBackend for MockBackend {
    type Media = MockMedia;

    fn name(&self) -> &str {
        "mock-backend"
    }

    fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), AmanogawaError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(AmanogawaError::channel("mock connect refused"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AmanogawaError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<SentMessage, AmanogawaError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(AmanogawaError::channel("mock send failed"));
        }
        let mut state = self.state.lock().await;
        let id = state.allocate_id();
        state.history.push(ChatMessage {
            id,
            date: Utc::now(),
            outgoing: true,
            media: None,
        });
        state.sent.push(text.to_string());
        if let Some(replies) = state.exchanges.pop_front() {
            state.pending.extend(replies);
        }
        Ok(SentMessage { id: Some(id) })
    }

    async fn recent_messages(
        &self,
        limit: usize,
    ) -> Result<Vec<ChatMessage<MockMedia>>, AmanogawaError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        if self.drop_on_poll.swap(false, Ordering::SeqCst) {
            self.connected.store(false, Ordering::SeqCst);
            return Err(AmanogawaError::channel("mock connection reset"));
        }
        let failing = self
            .failing_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(AmanogawaError::channel("mock history read failed"));
        }

        let mut state = self.state.lock().await;
        let mut still_hidden = Vec::new();
        for mut reply in std::mem::take(&mut state.pending) {
            if reply.hidden_polls == 0 {
                state.post(reply.body, Utc::now());
            } else {
                reply.hidden_polls -= 1;
                still_hidden.push(reply);
            }
        }
        state.pending = still_hidden;

        Ok(state.history.iter().rev().take(limit).cloned().collect())
    }

    async fn stream_chunks(
        &self,
        media: &MockMedia,
        first_chunk: u64,
    ) -> Result<ChunkStream, AmanogawaError> {
        let content = Arc::clone(&media.content);
        let chunk_size = self.chunk_size as usize;
        let fail_after = self.chunk_fail_after;
        let served = Arc::clone(&self.chunks_served);
        let start = (first_chunk as usize).saturating_mul(chunk_size);

        let chunks = stream::unfold((start, 0usize), move |(pos, produced)| {
            let content = Arc::clone(&content);
            let served = Arc::clone(&served);
            async move {
                if fail_after == Some(produced) {
                    // usize::MAX parks the stream in its finished state after the error.
                    return Some((
                        Err(AmanogawaError::channel("mock download interrupted")),
                        (usize::MAX, usize::MAX),
                    ));
                }
                if pos >= content.len() {
                    return None;
                }
                let end = (pos + chunk_size).min(content.len());
                served.fetch_add(1, Ordering::SeqCst);
                Some((Ok(content[pos..end].to_vec()), (end, produced + 1)))
            }
        });
        Ok(chunks.boxed())
    }
}

/// Deterministic test content: byte `i` is `i % 251`.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_records_command_and_outgoing_message() {
        let backend = MockBackend::new();
        let sent = backend.send_text("/start sep_42").await.unwrap();
        assert_eq!(sent.id, Some(1));
        assert_eq!(backend.sent_commands().await, vec!["/start sep_42"]);

        let history = backend.recent_messages(5).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].outgoing);
    }

    #[tokio::test]
    async fn scripted_reply_appears_after_hidden_polls() {
        let backend = MockBackend::new();
        backend.script_reply(Reply::video(vec![1, 2, 3]).after_polls(2)).await;
        backend.send_text("/start sep_1").await.unwrap();

        assert_eq!(backend.recent_messages(5).await.unwrap().len(), 1);
        assert_eq!(backend.recent_messages(5).await.unwrap().len(), 1);
        let history = backend.recent_messages(5).await.unwrap();
        assert_eq!(history.len(), 2);
        let media = history[0].media.as_ref().expect("newest message has media");
        assert_eq!(media.size_bytes, Some(3));
    }

    #[tokio::test]
    async fn history_is_newest_first_and_limited() {
        let backend = MockBackend::new();
        for _ in 0..4 {
            backend.push_history(Reply::text(), Utc::now()).await;
        }
        let history = backend.recent_messages(2).await.unwrap();
        assert_eq!(
            history.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![4, 3]
        );
    }

    #[tokio::test]
    async fn failing_polls_recover() {
        let backend = MockBackend::new();
        backend.fail_next_polls(1);
        assert!(backend.recent_messages(5).await.is_err());
        assert!(backend.recent_messages(5).await.is_ok());
        assert_eq!(backend.poll_calls(), 2);
    }

    #[tokio::test]
    async fn chunks_start_at_requested_index() {
        let backend = MockBackend::new().with_chunk_size(4);
        let media = MockMedia {
            message_id: 1,
            content: Arc::new(patterned_bytes(10)),
        };
        let chunks: Vec<Vec<u8>> = backend
            .stream_chunks(&media, 1)
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec![vec![4, 5, 6, 7], vec![8, 9]]);
        assert_eq!(backend.chunks_served(), 2);
    }

    #[tokio::test]
    async fn chunk_failure_ends_stream_with_error() {
        let backend = MockBackend::new()
            .with_chunk_size(4)
            .with_chunk_failure_after(1);
        let media = MockMedia {
            message_id: 1,
            content: Arc::new(patterned_bytes(12)),
        };
        let items: Vec<_> = backend.stream_chunks(&media, 0).await.unwrap().collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        let backend = MockBackend::new();
        backend.set_fail_connect(true);
        assert!(backend.connect().await.is_err());
        assert!(!backend.is_connected());
        assert_eq!(backend.connect_calls(), 1);
    }
}
