// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stremio addon protocol objects.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Content types the addon serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Series,
    Movie,
}

impl ContentType {
    pub fn for_title(is_movie: bool) -> Self {
        if is_movie { Self::Movie } else { Self::Series }
    }

    pub fn is_movie(self) -> bool {
        self == Self::Movie
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: &'static str,
    pub version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub logo: String,
    pub types: Vec<ContentType>,
    pub catalogs: Vec<CatalogDescriptor>,
    pub resources: Vec<&'static str>,
    pub id_prefixes: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogDescriptor {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub id: &'static str,
    pub name: &'static str,
    pub extra: Vec<ExtraField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtraField {
    pub name: &'static str,
}

/// Catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct MetaPreview {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub name: String,
    pub poster: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
}

/// Full detail object for one title.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    pub poster: String,
    pub genres: Vec<String>,
    pub runtime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub director: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<Video>,
}

/// One episode of a series.
#[derive(Debug, Clone, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub season: i64,
    pub episode: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior_hints: Option<BehaviorHints>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    pub not_web_ready: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogResponse {
    pub metas: Vec<MetaPreview>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetaResponse {
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamResponse {
    pub streams: Vec<Stream>,
}
