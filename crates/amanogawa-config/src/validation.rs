// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express, such as
//! non-zero timeouts, parseable URLs and a poll interval shorter than the timeout.

use crate::diagnostic::ConfigError;
use crate::model::AmanogawaConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound on messages fetched per poll; Telegram caps history pages at 100.
const MAX_HISTORY_WINDOW: usize = 100;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AmanogawaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if !is_http_url(&config.server.base_url) {
        fail(format!(
            "server.base_url `{}` must start with http:// or https://",
            config.server.base_url
        ));
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        fail(format!(
            "server.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.server.log_level
        ));
    }

    if config.telegram.api_id < 0 {
        fail(format!(
            "telegram.api_id must not be negative, got {}",
            config.telegram.api_id
        ));
    }

    let bot = config.telegram.bot_username.trim();
    if bot.is_empty() {
        fail("telegram.bot_username must not be empty".to_string());
    } else if bot.starts_with('@') {
        fail(format!(
            "telegram.bot_username `{bot}` must not include the leading `@`"
        ));
    }

    if config.telegram.session_file.trim().is_empty() {
        fail("telegram.session_file must not be empty".to_string());
    }

    let resolver = &config.resolver;
    if resolver.deep_link_marker.chars().any(char::is_whitespace) {
        fail("resolver.deep_link_marker must not contain whitespace".to_string());
    }
    if resolver.timeout_secs == 0 {
        fail("resolver.timeout_secs must be greater than zero".to_string());
    }
    if resolver.poll_interval_ms == 0 {
        fail("resolver.poll_interval_ms must be greater than zero".to_string());
    } else if resolver.timeout_secs > 0 && resolver.poll_interval() >= resolver.timeout() {
        fail(format!(
            "resolver.poll_interval_ms ({}) must be shorter than resolver.timeout_secs ({}s)",
            resolver.poll_interval_ms, resolver.timeout_secs
        ));
    }
    if !(1..=MAX_HISTORY_WINDOW).contains(&resolver.history_window) {
        fail(format!(
            "resolver.history_window must be between 1 and {MAX_HISTORY_WINDOW}, got {}",
            resolver.history_window
        ));
    }
    if resolver.cache_ttl_secs == 0 {
        fail("resolver.cache_ttl_secs must be greater than zero".to_string());
    }

    let catalog = &config.catalog;
    if !is_http_url(&catalog.base_url) {
        fail(format!(
            "catalog.base_url `{}` must start with http:// or https://",
            catalog.base_url
        ));
    }
    if catalog.request_timeout_secs == 0 {
        fail("catalog.request_timeout_secs must be greater than zero".to_string());
    }
    if catalog.page_size == 0 {
        fail("catalog.page_size must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AmanogawaConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = AmanogawaConfig::default();
        config.resolver.timeout_secs = 0;
        config.resolver.history_window = 0;
        config.catalog.base_url = "ftp://example.org".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "got: {errors:?}");
    }

    #[test]
    fn poll_interval_must_be_shorter_than_timeout() {
        let mut config = AmanogawaConfig::default();
        config.resolver.timeout_secs = 1;
        config.resolver.poll_interval_ms = 1000;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn bot_username_with_at_sign_is_rejected() {
        let mut config = AmanogawaConfig::default();
        config.telegram.bot_username = "@amanogawa_ua_bot".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut config = AmanogawaConfig::default();
        config.server.log_level = "verbose".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn url_check_requires_scheme_and_host() {
        assert!(is_http_url("http://localhost:7000"));
        assert!(is_http_url("https://amanogawa.space"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("amanogawa.space"));
    }
}
