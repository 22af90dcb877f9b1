// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Range-to-chunk adapter.
//!
//! The download primitive can only start at chunk boundaries. A byte offset is
//! split into the chunk to start from and the number of leading bytes to drop
//! from that first chunk.

use amanogawa_core::{ChunkStream, EpisodeId, MediaHandle, MessagingBackend, ResolveError};
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, error, info};

/// Lazy, finite stream of response body bytes.
pub type ByteStream = BoxStream<'static, Vec<u8>>;

/// Where a transfer starting at some byte offset begins in chunk terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Index of the first chunk to fetch.
    pub chunk_index: u64,
    /// Leading bytes of that chunk which precede the requested offset.
    pub skip: usize,
}

/// Splits `offset` into a chunk index and an in-chunk skip.
///
/// `chunk_size` must be non-zero.
pub fn plan(offset: u64, chunk_size: u64) -> ChunkPlan {
    ChunkPlan {
        chunk_index: offset / chunk_size,
        skip: (offset % chunk_size) as usize,
    }
}

/// Opens a byte stream over `handle` starting at `offset`.
///
/// Transport errors end the stream early; bytes already yielded stay yielded.
/// Dropping the stream stops further chunk fetches.
pub async fn open<B: MessagingBackend>(
    backend: &B,
    handle: &MediaHandle<B::Media>,
    offset: u64,
) -> Result<ByteStream, ResolveError> {
    let chunk_size = backend.chunk_size().max(1);
    let plan = plan(offset, chunk_size);
    debug!(
        episode_id = %handle.episode_id(),
        offset,
        chunk_index = plan.chunk_index,
        skip = plan.skip,
        "opening chunk stream"
    );

    let chunks = backend
        .stream_chunks(handle.media(), plan.chunk_index)
        .await
        .map_err(|e| ResolveError::ChannelUnavailable(e.to_string()))?;

    Ok(trimmed(chunks, plan.skip, handle.episode_id(), offset))
}

/// Per-stream bookkeeping; logs the transfer total when the stream goes away.
struct Transfer {
    chunks: ChunkStream,
    skip: usize,
    episode_id: EpisodeId,
    offset: u64,
    bytes_sent: u64,
}

impl Drop for Transfer {
    fn drop(&mut self) {
        info!(
            episode_id = %self.episode_id,
            offset = self.offset,
            bytes_sent = self.bytes_sent,
            "stream done"
        );
    }
}

fn trimmed(chunks: ChunkStream, skip: usize, episode_id: EpisodeId, offset: u64) -> ByteStream {
    let transfer = Transfer {
        chunks,
        skip,
        episode_id,
        offset,
        bytes_sent: 0,
    };

    stream::unfold(transfer, |mut transfer| async move {
        loop {
            match transfer.chunks.next().await? {
                Ok(mut chunk) => {
                    if transfer.skip > 0 {
                        let dropped = transfer.skip.min(chunk.len());
                        chunk.drain(..dropped);
                        transfer.skip -= dropped;
                    }
                    if chunk.is_empty() {
                        continue;
                    }
                    transfer.bytes_sent += chunk.len() as u64;
                    metrics::counter!("amanogawa_stream_bytes_total").increment(chunk.len() as u64);
                    return Some((chunk, transfer));
                }
                Err(e) => {
                    error!(
                        episode_id = %transfer.episode_id,
                        bytes_sent = transfer.bytes_sent,
                        error = %e,
                        "stream error"
                    );
                    return None;
                }
            }
        }
    })
    .boxed()
}
