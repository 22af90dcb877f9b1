// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the amanogawa.space catalog API.
//!
//! Wraps the title listing, title detail and episode endpoints, aggregates
//! paginated listings and caches responses in memory.

pub mod client;
pub mod model;

pub use client::CatalogClient;
pub use model::{Episode, Page, Title};
