// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Amanogawa addon.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level addon configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AmanogawaConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Telegram user session settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Correlation resolver and media cache settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Catalog API client settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Prometheus metrics settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public URL under which clients reach this server. Used to build stream URLs.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7000
}

fn default_base_url() -> String {
    "http://localhost:7000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram user session configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Application id from my.telegram.org. Zero means unset.
    #[serde(default)]
    pub api_id: i32,

    /// Application hash from my.telegram.org.
    #[serde(default)]
    pub api_hash: String,

    /// Path of the persisted session file created by `amanogawa login`.
    #[serde(default = "default_session_file")]
    pub session_file: String,

    /// Username of the content bot, without the leading `@`.
    #[serde(default = "default_bot_username")]
    pub bot_username: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_id: 0,
            api_hash: String::new(),
            session_file: default_session_file(),
            bot_username: default_bot_username(),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_id", &self.api_id)
            .field("api_hash", &"[redacted]")
            .field("session_file", &self.session_file)
            .field("bot_username", &self.bot_username)
            .finish()
    }
}

impl TelegramConfig {
    /// Whether API credentials are present.
    pub fn has_credentials(&self) -> bool {
        self.api_id != 0 && !self.api_hash.is_empty()
    }
}

fn default_session_file() -> String {
    "amanogawa.session".to_string()
}

fn default_bot_username() -> String {
    "amanogawa_ua_bot".to_string()
}

/// Correlation resolver and media cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Literal placed between `/start ` and the episode id in the deep-link command.
    #[serde(default = "default_deep_link_marker")]
    pub deep_link_marker: String,

    /// How long to wait for the bot's reply.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between conversation history polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Number of recent messages fetched per poll.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// How long a resolved media handle stays cached.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            deep_link_marker: default_deep_link_marker(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            history_window: default_history_window(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_deep_link_marker() -> String {
    "sep_".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1500
}

fn default_history_window() -> usize {
    5
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

/// Catalog API client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Base URL of the catalog site.
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Cache lifetime of catalog pages and the full title list.
    #[serde(default = "default_catalog_ttl_secs")]
    pub catalog_ttl_secs: u64,

    /// Cache lifetime of single title details.
    #[serde(default = "default_detail_ttl_secs")]
    pub title_ttl_secs: u64,

    /// Cache lifetime of episode lists.
    #[serde(default = "default_detail_ttl_secs")]
    pub episodes_ttl_secs: u64,

    /// Number of titles the catalog returns per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            catalog_ttl_secs: default_catalog_ttl_secs(),
            title_ttl_secs: default_detail_ttl_secs(),
            episodes_ttl_secs: default_detail_ttl_secs(),
            page_size: default_page_size(),
        }
    }
}

fn default_catalog_base_url() -> String {
    "https://amanogawa.space".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_catalog_ttl_secs() -> u64 {
    300
}

fn default_detail_ttl_secs() -> u64 {
    900
}

fn default_page_size() -> u32 {
    10
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default)]
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = AmanogawaConfig::default();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.telegram.bot_username, "amanogawa_ua_bot");
        assert_eq!(config.resolver.deep_link_marker, "sep_");
        assert_eq!(config.resolver.timeout(), Duration::from_secs(30));
        assert_eq!(config.resolver.poll_interval(), Duration::from_millis(1500));
        assert_eq!(config.resolver.history_window, 5);
        assert_eq!(config.resolver.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.catalog.catalog_ttl_secs, 300);
        assert_eq!(config.catalog.title_ttl_secs, 900);
        assert_eq!(config.catalog.episodes_ttl_secs, 900);
        assert!(!config.prometheus.enabled);
    }

    #[test]
    fn telegram_debug_redacts_api_hash() {
        let config = TelegramConfig {
            api_id: 12345,
            api_hash: "0123456789abcdef".into(),
            ..TelegramConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("12345"));
        assert!(!debug.contains("0123456789abcdef"));
    }

    #[test]
    fn credentials_require_both_id_and_hash() {
        let mut config = TelegramConfig::default();
        assert!(!config.has_credentials());
        config.api_id = 1;
        assert!(!config.has_credentials());
        config.api_hash = "hash".into();
        assert!(config.has_credentials());
    }
}
