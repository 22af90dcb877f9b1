// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Amanogawa integration tests.
//!
//! Provides a scripted messaging backend for fast, deterministic,
//! CI-runnable tests without a Telegram account.
//!
//! # Components
//!
//! - [`MockBackend`] - Mock content bot with scripted replies, injectable
//!   failures and in-memory chunked media

pub mod mock_backend;

pub use mock_backend::{patterned_bytes, MockBackend, MockMedia, Reply, DEFAULT_CHUNK_SIZE};
