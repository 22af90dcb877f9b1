// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Amanogawa Stremio addon.
//!
//! Serves the addon manifest, catalog, meta and stream resources backed by
//! the catalog API, the `/stream-proxy` endpoint that relays videos through
//! the messaging bridge, and public `/health` and `/metrics` endpoints.

pub mod handlers;
pub mod proxy;
pub mod server;

pub use proxy::{parse_range_start, plan_response, ResponsePlan};
pub use server::{router, serve, start_server, AppState, HealthState, ServerConfig, DRAIN_TIMEOUT};
