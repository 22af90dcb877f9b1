// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seams between the bridge and its transports.

pub mod backend;

pub use backend::{ChunkStream, MessagingBackend};
