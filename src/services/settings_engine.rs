// SmartMarks Settings Engine
// Loads application settings: JSON file (optional) -> environment overrides -> validation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::services::identity::resolve_site_url;
use crate::types::errors::SettingsError;
use crate::types::settings::{AppSettings, BackendKind};

pub const ENV_SITE_URL: &str = "SMARTMARKS_SITE_URL";
pub const ENV_DATA_DIR: &str = "SMARTMARKS_DATA_DIR";
pub const ENV_BACKEND_URL: &str = "SMARTMARKS_BACKEND_URL";
pub const ENV_API_KEY: &str = "SMARTMARKS_API_KEY";
pub const ENV_LOG: &str = "SMARTMARKS_LOG";
/// Optional path of the JSON settings file.
pub const ENV_CONFIG: &str = "SMARTMARKS_CONFIG";

const DATABASE_FILE: &str = "smartmarks.db";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn get_config_path(&self) -> Option<&Path>;
}

/// Settings engine backed by an optional JSON file plus environment overrides.
pub struct SettingsEngine {
    config_path: Option<PathBuf>,
    settings: AppSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine reading from `config_path` when given.
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }

    /// Creates an engine using the file named by `SMARTMARKS_CONFIG`, if set.
    pub fn from_env() -> Self {
        Self::new(std::env::var_os(ENV_CONFIG).map(PathBuf::from))
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Blank values are treated as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(site_url) = get(ENV_SITE_URL) {
            self.settings.site_url = site_url;
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.settings.backend.database_path =
                Path::new(&dir).join(DATABASE_FILE).to_string_lossy().to_string();
        }
        if let Some(url) = get(ENV_BACKEND_URL) {
            self.settings.backend.url = Some(url);
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.settings.backend.api_key = Some(key);
        }
        if let Some(filter) = get(ENV_LOG) {
            self.settings.logging.filter = filter;
        }

        self.settings.site_url = resolve_site_url(Some(&self.settings.site_url));
    }

    /// Checks cross-field requirements.
    pub fn validate(settings: &AppSettings) -> Result<(), SettingsError> {
        if settings.realtime.buffer == 0 {
            return Err(SettingsError::InvalidValue(
                "realtime.buffer must be at least 1".to_string(),
            ));
        }
        if settings.realtime.feed.table.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "realtime.feed.table must not be empty".to_string(),
            ));
        }
        if settings.backend.timeout_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "backend.timeout_secs must be at least 1".to_string(),
            ));
        }
        if settings.backend.kind == BackendKind::Rest {
            if settings.backend.url.is_none() {
                return Err(SettingsError::InvalidValue(
                    "backend.url is required for the rest backend".to_string(),
                ));
            }
            if settings.backend.api_key.is_none() {
                return Err(SettingsError::InvalidValue(
                    "backend.api_key is required for the rest backend".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Full load: file, process environment, validation.
    pub fn load_with_env(&mut self) -> Result<AppSettings, SettingsError> {
        self.load()?;
        self.apply_overrides(|key| std::env::var(key).ok());
        Self::validate(&self.settings)?;
        Ok(self.settings.clone())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file (or no configured path) yields defaults; a malformed file is
    /// an error.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        let path = match &self.config_path {
            Some(p) if p.exists() => p,
            _ => {
                self.settings = AppSettings::default();
                return Ok(self.settings.clone());
            }
        };

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("Failed to read config file: {}", e)))?;

        let settings: AppSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::Serialization(format!("Failed to parse config file: {}", e))
        })?;

        tracing::debug!(path = %path.display(), "settings loaded");
        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Writes the current settings to the config file, creating parent directories.
    fn save(&self) -> Result<(), SettingsError> {
        let path = self
            .config_path
            .as_ref()
            .ok_or_else(|| SettingsError::Io("No config path configured".to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::Io(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::Serialization(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::Io(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    fn get_config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
