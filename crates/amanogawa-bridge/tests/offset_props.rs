// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for byte offset to chunk translation.

use std::sync::Arc;

use amanogawa_bridge::{chunk, plan};
use amanogawa_core::{EpisodeId, MediaHandle, RemoteMedia};
use amanogawa_test_utils::{patterned_bytes, MockBackend, MockMedia};
use futures::StreamExt;
use proptest::prelude::*;

proptest! {
    #[test]
    fn plan_reconstructs_offset(offset in 0u64..u64::MAX / 2, chunk_size in 1u64..(16 * 1024 * 1024)) {
        let p = plan(offset, chunk_size);
        prop_assert!((p.skip as u64) < chunk_size);
        prop_assert_eq!(p.chunk_index * chunk_size + p.skip as u64, offset);
    }

    #[test]
    fn stream_from_offset_equals_suffix(
        len in 0usize..2048,
        chunk_size in 1u64..300,
        offset_seed in any::<usize>(),
    ) {
        let content = patterned_bytes(len);
        let offset = if len == 0 { 0 } else { offset_seed % (len + 1) };

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let body = runtime.block_on(async {
            let backend = MockBackend::new().with_chunk_size(chunk_size);
            let handle = MediaHandle::new(
                EpisodeId(1),
                1,
                RemoteMedia {
                    inner: MockMedia { message_id: 1, content: Arc::new(content.clone()) },
                    size_bytes: Some(len as u64),
                    mime_type: None,
                },
            );
            let stream = chunk::open(&backend, &handle, offset as u64).await.unwrap();
            stream.collect::<Vec<_>>().await.concat()
        });

        prop_assert_eq!(&body[..], &content[offset..]);
    }
}
