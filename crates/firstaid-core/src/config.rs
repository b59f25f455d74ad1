//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! identity service base URL, request timeout, optional session max age,
//! display locale, and the last email used to log in.
//!
//! Configuration is stored at `~/.config/firstaid-keyring/config.json`.
//! Environment variables override the file (see [`Config::apply_env`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::messages::Locale;

/// Application name used for config/data directory paths
const APP_NAME: &str = "firstaid-keyring";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Directory (under the data dir) holding persisted session keys
const SESSION_DIR: &str = "session";

/// Default identity service location, matching a local development backend.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

pub const ENV_API_URL: &str = "FIRSTAID_API_URL";
pub const ENV_EMAIL: &str = "FIRSTAID_EMAIL";
pub const ENV_PASSWORD: &str = "FIRSTAID_PASSWORD";
pub const ENV_LOCALE: &str = "FIRSTAID_LOCALE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Stored sessions older than this are discarded on load.
    /// `None` trusts the token until the server rejects it.
    pub session_max_age_days: Option<i64>,
    pub locale: Locale,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_max_age_days: None,
            locale: Locale::default(),
            last_email: None,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the file
    /// is missing, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Record the last login email in the file at `path`, leaving the rest of
    /// the stored config as it was (environment overrides are not written).
    pub fn store_last_email(path: &Path, email: &str) -> Result<()> {
        let mut stored = Self::load_from(path)?;
        stored.last_email = Some(email.to_string());
        stored.save_to(path)
    }

    /// Apply `FIRSTAID_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(locale) = lookup(ENV_LOCALE) {
            match locale.parse() {
                Ok(locale) => self.locale = locale,
                Err(_) => warn!(value = %locale, "Ignoring unknown locale"),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_max_age(&self) -> Option<chrono::Duration> {
        self.session_max_age_days.map(chrono::Duration::days)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root of per-user data (session keys, log files).
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn session_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(SESSION_DIR))
    }
}
