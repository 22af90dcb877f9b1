// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stremio addon protocol for the Amanogawa catalog.
//!
//! Protocol objects, addon id handling and pure mapping functions from
//! catalog records. Nothing in this crate performs I/O.

pub mod ids;
pub mod mapping;
pub mod protocol;

pub use ids::{parse_stream_id, parse_title_id, CatalogExtra, ID_PREFIX};
pub use mapping::{manifest, to_catalog_meta, to_meta, to_streams};
pub use protocol::{
    CatalogResponse, ContentType, Manifest, Meta, MetaPreview, MetaResponse, Stream,
    StreamResponse, Video,
};
