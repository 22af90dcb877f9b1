// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the catalog API with per-endpoint response caching.

use std::sync::Arc;
use std::time::Duration;

use amanogawa_config::model::CatalogConfig;
use amanogawa_core::{AmanogawaError, TtlCache};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::model::{Episode, Page, Title};

/// Client for the catalog REST API.
///
/// Responses are cached in memory: catalog pages and the aggregated title list
/// for `catalog_ttl_secs`, title details and episode lists for their own TTLs.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    pages: TtlCache<u32, Arc<Page<Title>>>,
    all_titles: TtlCache<(), Arc<Vec<Title>>>,
    titles: TtlCache<i64, Arc<Title>>,
    episodes: TtlCache<i64, Arc<Vec<Episode>>>,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, AmanogawaError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("amanogawa-addon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| catalog_error("building HTTP client failed", e))?;

        let catalog_ttl = Duration::from_secs(config.catalog_ttl_secs);
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            pages: TtlCache::new(catalog_ttl),
            all_titles: TtlCache::new(catalog_ttl),
            titles: TtlCache::new(Duration::from_secs(config.title_ttl_secs)),
            episodes: TtlCache::new(Duration::from_secs(config.episodes_ttl_secs)),
        })
    }

    /// Base URL of the catalog site, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One page of the title listing (1-based).
    pub async fn catalog_page(&self, page: u32) -> Result<Arc<Page<Title>>, AmanogawaError> {
        if let Some(cached) = self.pages.lookup(&page) {
            return Ok(cached);
        }
        let fetched = Arc::new(self.fetch_titles_page(page).await?);
        self.pages.store(page, Arc::clone(&fetched));
        Ok(fetched)
    }

    /// Every title across all pages of the listing.
    pub async fn all_titles(&self) -> Result<Arc<Vec<Title>>, AmanogawaError> {
        if let Some(cached) = self.all_titles.lookup(&()) {
            return Ok(cached);
        }

        let first = self.fetch_titles_page(1).await?;
        let mut titles = first.data;
        for page in 2..=first.pages {
            titles.extend(self.fetch_titles_page(page).await?.data);
        }
        info!(pages = first.pages, titles = titles.len(), "loaded full catalog");

        let titles = Arc::new(titles);
        self.all_titles.store((), Arc::clone(&titles));
        Ok(titles)
    }

    /// Details of a single title.
    pub async fn title(&self, title_id: i64) -> Result<Arc<Title>, AmanogawaError> {
        if let Some(cached) = self.titles.lookup(&title_id) {
            return Ok(cached);
        }
        let title: Arc<Title> = Arc::new(self.get_json(&format!("/api/title/{title_id}")).await?);
        self.titles.store(title_id, Arc::clone(&title));
        Ok(title)
    }

    /// All episodes of a title, sorted by episode number.
    pub async fn episodes(&self, title_id: i64) -> Result<Arc<Vec<Episode>>, AmanogawaError> {
        if let Some(cached) = self.episodes.lookup(&title_id) {
            return Ok(cached);
        }

        let path = format!("/api/episodes/{title_id}");
        let first: Page<Episode> = self.get_json(&format!("{path}?page=1")).await?;
        let mut episodes = first.data;
        for page in 2..=first.pages {
            let next: Page<Episode> = self.get_json(&format!("{path}?page={page}")).await?;
            episodes.extend(next.data);
        }
        episodes.sort_by_key(|episode| episode.number);

        let episodes = Arc::new(episodes);
        self.episodes.store(title_id, Arc::clone(&episodes));
        Ok(episodes)
    }

    async fn fetch_titles_page(&self, page: u32) -> Result<Page<Title>, AmanogawaError> {
        self.get_json(&format!("/api/titles?page={page}")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AmanogawaError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "catalog request");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| catalog_error(&format!("GET {path} failed"), e))?
            .error_for_status()
            .map_err(|e| catalog_error(&format!("GET {path} returned an error status"), e))?;

        response
            .json()
            .await
            .map_err(|e| catalog_error(&format!("decoding {path} failed"), e))
    }
}

fn catalog_error(context: &str, err: reqwest::Error) -> AmanogawaError {
    AmanogawaError::Catalog {
        message: format!("{context}: {err}"),
        source: Some(Box::new(err)),
    }
}
