//! Client settings: defaults, `~/.newsdesk/config.json`, then environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = ".newsdesk";
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_STATUS_CLEAR_DELAY_SECS: u64 = 3;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

pub const ENV_API_URL: &str = "NEWSDESK_API_URL";
pub const ENV_WS_URL: &str = "NEWSDESK_WS_URL";
pub const ENV_TOKEN: &str = "NEWSDESK_TOKEN";

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the REST API.
    pub api_url: String,
    /// Pipeline socket URL. Derived from `api_url` when unset.
    pub ws_url: Option<String>,
    /// Bearer token for authenticated endpoints.
    pub token: Option<String>,
    /// Seconds the status narrative lingers after an answer completes.
    pub status_clear_delay_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: None,
            token: None,
            status_clear_delay_secs: DEFAULT_STATUS_CLEAR_DELAY_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings from the default config file and the process environment.
    pub fn load() -> Result<Self> {
        let mut settings = match default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Read settings from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config at {}", path.display()))
    }

    /// Overlay environment variables, looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(url) = lookup(ENV_WS_URL).filter(|v| !v.is_empty()) {
            self.ws_url = Some(url);
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
    }

    /// Socket URL: explicit setting, or `api_url` with a `ws` scheme and `/ws` path.
    pub fn socket_url(&self) -> String {
        if let Some(ref url) = self.ws_url {
            return url.clone();
        }
        let base = self.api_url.trim_end_matches('/');
        let base = base
            .strip_prefix("https://")
            .map(|rest| format!("wss://{rest}"))
            .or_else(|| base.strip_prefix("http://").map(|rest| format!("ws://{rest}")))
            .unwrap_or_else(|| base.to_string());
        format!("{base}/ws")
    }

    pub const fn status_clear_delay(&self) -> Duration {
        Duration::from_secs(self.status_clear_delay_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `~/.newsdesk/config.json`, if a home directory exists.
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn socket_url_is_derived_from_api_url() {
        let mut settings = Settings::default();
        assert_eq!(settings.socket_url(), "ws://127.0.0.1:8000/ws");

        settings.api_url = "https://news.example.com/".to_string();
        assert_eq!(settings.socket_url(), "wss://news.example.com/ws");

        settings.ws_url = Some("ws://other:9000/socket".to_string());
        assert_eq!(settings.socket_url(), "ws://other:9000/socket");
    }

    #[test]
    fn file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_url": "http://kb.local:8080"}"#).unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.api_url, "http://kb.local:8080");
        assert_eq!(settings.status_clear_delay(), Duration::from_secs(3));
        assert!(settings.token.is_none());
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Settings::from_file(&path).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://env-host:1234"),
            (ENV_TOKEN, "tok-123"),
            (ENV_WS_URL, ""),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|key| env.get(key).map(ToString::to_string));

        assert_eq!(settings.api_url, "http://env-host:1234");
        assert_eq!(settings.token.as_deref(), Some("tok-123"));
        assert!(settings.ws_url.is_none());
    }
}
