// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Addon content ids and catalog extra arguments.

/// Prefix of every id this addon owns.
pub const ID_PREFIX: &str = "amngw:";

/// `amngw:{title_id}`.
pub fn title_id(id: i64) -> String {
    format!("{ID_PREFIX}{id}")
}

/// `amngw:{title_id}:{episode}`.
pub fn episode_id(title_id: i64, episode: i64) -> String {
    format!("{ID_PREFIX}{title_id}:{episode}")
}

/// Parses `amngw:133` into `133`.
pub fn parse_title_id(id: &str) -> Option<i64> {
    id.strip_prefix(ID_PREFIX)?.parse().ok()
}

/// Parses `amngw:133:1` into `(133, Some(1))` and `amngw:133` into `(133, None)`.
pub fn parse_stream_id(id: &str) -> Option<(i64, Option<i64>)> {
    let mut parts = id.strip_prefix(ID_PREFIX)?.split(':');
    let title = parts.next()?.parse().ok()?;
    let episode = match parts.next() {
        Some(episode) => Some(episode.parse().ok()?),
        None => None,
    };
    Some((title, episode))
}

/// The optional path segment of a catalog request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogExtra {
    None,
    Skip(u32),
    Search(String),
}

impl CatalogExtra {
    /// Parses a decoded `skip=N` or `search=Q` segment. Anything else is ignored.
    pub fn parse(segment: &str) -> Self {
        for pair in segment.split('&') {
            match pair.split_once('=') {
                Some(("search", query)) if !query.trim().is_empty() => {
                    return Self::Search(query.trim().to_string());
                }
                Some(("skip", skip)) => {
                    if let Ok(skip) = skip.parse() {
                        return Self::Skip(skip);
                    }
                }
                _ => {}
            }
        }
        Self::None
    }

    /// Catalog page holding the first item after `skip` (1-based).
    pub fn page(&self, page_size: u32) -> u32 {
        match self {
            Self::Skip(skip) => skip / page_size.max(1) + 1,
            _ => 1,
        }
    }
}
