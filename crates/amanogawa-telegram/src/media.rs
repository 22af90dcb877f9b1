// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of Telegram messages into backend-neutral chat messages.

use amanogawa_core::{ChatMessage, RemoteMedia};
use grammers_client::types::{Media, Message};

/// Converts a Telegram message. Only documents (which include videos) count as media.
pub(crate) fn to_chat_message(message: &Message) -> ChatMessage<Media> {
    ChatMessage {
        id: i64::from(message.id()),
        date: message.date(),
        outgoing: message.outgoing(),
        media: message.media().and_then(remote_media),
    }
}

fn remote_media(media: Media) -> Option<RemoteMedia<Media>> {
    let (size_bytes, mime_type) = match &media {
        Media::Document(document) => (
            reported_size(document.size()),
            document.mime_type().map(str::to_string),
        ),
        _ => return None,
    };
    Some(RemoteMedia {
        inner: media,
        size_bytes,
        mime_type,
    })
}

/// Telegram reports sizes as signed integers; zero or negative means unknown.
pub(crate) fn reported_size(size: i64) -> Option<u64> {
    u64::try_from(size).ok().filter(|s| *s > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_size_is_kept() {
        assert_eq!(reported_size(734_003_200), Some(734_003_200));
    }

    #[test]
    fn zero_and_negative_sizes_are_unknown() {
        assert_eq!(reported_size(0), None);
        assert_eq!(reported_size(-1), None);
    }
}
