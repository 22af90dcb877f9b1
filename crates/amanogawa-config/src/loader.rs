// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./amanogawa.toml` > `~/.config/amanogawa/amanogawa.toml`
//! > `/etc/amanogawa/amanogawa.toml` with environment variable overrides via the
//! `AMANOGAWA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AmanogawaConfig;

/// Config file name looked up in every directory of the hierarchy.
pub const CONFIG_FILE_NAME: &str = "amanogawa.toml";

/// System-wide config path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/amanogawa/amanogawa.toml";

/// Sections whose env keys are rewritten from `section_key` to `section.key`.
const SECTIONS: &[&str] = &["server", "telegram", "resolver", "catalog", "prometheus"];

/// Path of the per-user config file, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("amanogawa").join(CONFIG_FILE_NAME))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/amanogawa/amanogawa.toml` (system-wide)
/// 3. `~/.config/amanogawa/amanogawa.toml` (user XDG config)
/// 4. `./amanogawa.toml` (local directory)
/// 5. `AMANOGAWA_*` environment variables
pub fn load_config() -> Result<AmanogawaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<AmanogawaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AmanogawaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AmanogawaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AmanogawaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AmanogawaConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `AMANOGAWA_TELEGRAM_API_HASH` must map to `telegram.api_hash`,
/// not `telegram.api.hash`.
fn env_provider() -> Env {
    Env::prefixed("AMANOGAWA_").map(|key| map_env_key(key.as_str()).into())
}

/// Rewrite a lowercased, prefix-stripped env key to its dotted config path.
fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
