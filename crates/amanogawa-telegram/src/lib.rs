// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram messaging backend for the Amanogawa addon.
//!
//! Implements [`MessagingBackend`] over an MTProto user session via
//! grammers. A user session is required because the content bot only hands
//! out videos in private chats with real accounts; the Bot API cannot talk
//! to other bots.

pub mod login;
mod media;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use amanogawa_config::model::TelegramConfig;
use amanogawa_core::{AmanogawaError, ChatMessage, ChunkStream, MessagingBackend, SentMessage};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use grammers_client::session::Session;
use grammers_client::types::{Downloadable, Media, PackedChat};
use grammers_client::{Client, Config, InitParams, InvocationError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub use login::{login, LoginPrompt};

/// Largest chunk the MTProto file download accepts: 512 KiB.
pub const CHUNK_SIZE: u64 = 512 * 1024;

/// A connected client and the resolved conversation with the content bot.
struct Connection {
    client: Client,
    bot: PackedChat,
}

/// Telegram user-session backend implementing [`MessagingBackend`].
pub struct TelegramBackend {
    config: TelegramConfig,
    connection: RwLock<Option<Connection>>,
    /// Shared with open download streams so they can report a dead connection.
    connected: Arc<AtomicBool>,
}

impl TelegramBackend {
    /// Creates a disconnected backend.
    ///
    /// Requires `telegram.api_id` and `telegram.api_hash` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, AmanogawaError> {
        if !config.has_credentials() {
            return Err(AmanogawaError::Config(
                "telegram.api_id and telegram.api_hash are required".into(),
            ));
        }
        Ok(Self {
            config,
            connection: RwLock::new(None),
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    async fn current(&self) -> Result<(Client, PackedChat), AmanogawaError> {
        self.connection
            .read()
            .await
            .as_ref()
            .map(|c| (c.client.clone(), c.bot))
            .ok_or_else(|| AmanogawaError::channel("telegram backend is not connected"))
    }
}

/// Loads the session file (creating it if absent) and opens an MTProto connection.
pub(crate) async fn open_client(config: &TelegramConfig) -> Result<Client, AmanogawaError> {
    let session = Session::load_file_or_create(&config.session_file)
        .map_err(|e| channel_error("loading session file failed", e))?;

    Client::connect(Config {
        session,
        api_id: config.api_id,
        api_hash: config.api_hash.clone(),
        params: InitParams {
            catch_up: false,
            ..InitParams::default()
        },
    })
    .await
    .map_err(|e| channel_error("telegram connect failed", e))
}

pub(crate) fn channel_error(
    context: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> AmanogawaError {
    AmanogawaError::Channel {
        message: format!("{context}: {err}"),
        source: Some(Box::new(err)),
    }
}

/// Maps a failed MTProto call, clearing `connected` when the connection is gone.
///
/// The next session acquire then reconnects instead of reusing a dead client.
fn invocation_error(connected: &AtomicBool, context: &str, err: InvocationError) -> AmanogawaError {
    if is_connection_loss(&err) {
        warn!(error = %err, "telegram connection lost");
        connected.store(false, Ordering::SeqCst);
    }
    channel_error(context, err)
}

/// An RPC error is an answer from Telegram; anything else means no connection.
fn is_connection_loss(err: &InvocationError) -> bool {
    !matches!(err, InvocationError::Rpc(_))
}

#[async_trait]
impl MessagingBackend for TelegramBackend {
    type Media = Media;

    fn name(&self) -> &str {
        "telegram"
    }

    fn chunk_size(&self) -> u64 {
        CHUNK_SIZE
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), AmanogawaError> {
        let client = open_client(&self.config).await?;

        let authorized = client
            .is_authorized()
            .await
            .map_err(|e| channel_error("authorization check failed", e))?;
        if !authorized {
            return Err(AmanogawaError::Config(format!(
                "telegram session `{}` is not authorized; run `amanogawa login` first",
                self.config.session_file
            )));
        }

        let bot = client
            .resolve_username(&self.config.bot_username)
            .await
            .map_err(|e| channel_error("resolving content bot failed", e))?
            .ok_or_else(|| {
                AmanogawaError::channel(format!("bot @{} not found", self.config.bot_username))
            })?;

        *self.connection.write().await = Some(Connection {
            client,
            bot: bot.pack(),
        });
        self.connected.store(true, Ordering::SeqCst);
        info!(bot = %self.config.bot_username, "telegram user session connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AmanogawaError> {
        self.connected.store(false, Ordering::SeqCst);
        let Some(connection) = self.connection.write().await.take() else {
            return Ok(());
        };
        connection
            .client
            .session()
            .save_to_file(&self.config.session_file)
            .map_err(|e| channel_error("saving session file failed", e))?;
        info!("telegram user session closed");
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<SentMessage, AmanogawaError> {
        let (client, bot) = self.current().await?;
        let sent = client
            .send_message(bot, text)
            .await
            .map_err(|e| invocation_error(&self.connected, "sending command failed", e))?;
        debug!(message_id = sent.id(), "command sent to bot");
        Ok(SentMessage {
            id: Some(i64::from(sent.id())),
        })
    }

    async fn recent_messages(
        &self,
        limit: usize,
    ) -> Result<Vec<ChatMessage<Media>>, AmanogawaError> {
        let (client, bot) = self.current().await?;
        let mut iter = client.iter_messages(bot).limit(limit);
        let mut messages = Vec::with_capacity(limit);
        while let Some(message) = iter
            .next()
            .await
            .map_err(|e| invocation_error(&self.connected, "reading bot history failed", e))?
        {
            messages.push(media::to_chat_message(&message));
        }
        Ok(messages)
    }

    async fn stream_chunks(
        &self,
        media: &Media,
        first_chunk: u64,
    ) -> Result<ChunkStream, AmanogawaError> {
        let (client, _) = self.current().await?;
        let skip = i32::try_from(first_chunk).map_err(|_| {
            AmanogawaError::Internal(format!("chunk index {first_chunk} out of range"))
        })?;

        let download = client
            .iter_download(&Downloadable::Media(media.clone()))
            .chunk_size(CHUNK_SIZE as i32)
            .skip_chunks(skip);

        let connected = Arc::clone(&self.connected);
        let chunks = stream::unfold(Some(download), move |download| {
            let connected = Arc::clone(&connected);
            async move {
                let mut download = download?;
                match download.next().await {
                    Ok(Some(chunk)) => Some((Ok(chunk), Some(download))),
                    Ok(None) => None,
                    Err(e) => {
                        warn!(error = %e, "telegram download failed");
                        let err = invocation_error(&connected, "downloading media failed", e);
                        Some((Err(err), None))
                    }
                }
            }
        });
        Ok(chunks.boxed())
    }
}
