use serde::{Deserialize, Serialize};

use crate::types::change::ChangeFeed;

/// Site URL used when no deployment URL is configured.
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";

/// Top-level application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Public base URL of the site; OAuth callbacks land on `{site_url}/auth/callback`.
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub realtime: RealtimeSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            backend: BackendSettings::default(),
            realtime: RealtimeSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn default_site_url() -> String {
    DEFAULT_SITE_URL.to_string()
}

/// Where bookmarks are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local SQLite database.
    #[default]
    Local,
    /// Remote PostgREST-style HTTP backend.
    Rest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default)]
    pub kind: BackendKind,
    /// SQLite file for the local backend.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Base URL of the hosted backend (auth and REST endpoints hang off it).
    #[serde(default)]
    pub url: Option<String>,
    /// Public API key sent with every backend request.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            database_path: default_database_path(),
            url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_database_path() -> String {
    "smartmarks.db".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeSettings {
    #[serde(default)]
    pub feed: ChangeFeed,
    /// Events buffered per subscriber before a slow subscriber starts missing them.
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            feed: ChangeFeed::default(),
            buffer: default_buffer(),
        }
    }
}

fn default_buffer() -> usize {
    256
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "smartmarks=info".to_string()
}
