//! User settings for LaPlata
//!
//! Persisted as `config.json`. The remote url and key can be overridden with
//! `LAPLATA_URL` and `LAPLATA_KEY` so they need not be written to disk.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::LaplataPaths;
use crate::error::LaplataError;
use crate::models::Money;
use crate::services::DashboardOptions;

pub const URL_ENV: &str = "LAPLATA_URL";
pub const KEY_ENV: &str = "LAPLATA_KEY";

/// Where data and accounts live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON files in the data directory
    #[default]
    Local,
    /// Hosted PostgREST + GoTrue
    Remote,
}

impl BackendKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Some(Self::Local),
            "remote" => Some(Self::Remote),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Hosted project coordinates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
}

/// Dashboard tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    #[serde(default = "default_low_balance_threshold")]
    pub low_balance_threshold: Money,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            source_timeout_ms: default_source_timeout_ms(),
            recent_limit: default_recent_limit(),
            low_balance_threshold: default_low_balance_threshold(),
        }
    }
}

/// User settings for LaPlata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Default log filter when neither `--verbose` nor `RUST_LOG` is given
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dashboard: DashboardSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_source_timeout_ms() -> u64 {
    5000
}

fn default_recent_limit() -> usize {
    5
}

fn default_low_balance_threshold() -> Money {
    Money::from_units(1000)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backend: BackendKind::default(),
            remote: RemoteSettings::default(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
            log_level: default_log_level(),
            dashboard: DashboardSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    pub fn load_or_create(paths: &LaplataPaths) -> Result<Self, LaplataError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| LaplataError::Io(format!("Failed to read settings file: {}", e)))?;

            serde_json::from_str(&contents).map_err(|e| {
                LaplataError::Config(format!("Failed to parse settings file: {}", e))
            })
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LaplataPaths) -> Result<(), LaplataError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LaplataError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| LaplataError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Apply `LAPLATA_URL` / `LAPLATA_KEY` on top of the saved values
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = non_empty_env(URL_ENV) {
            self.remote.url = Some(url);
        }
        if let Some(key) = non_empty_env(KEY_ENV) {
            self.remote.anon_key = Some(key);
        }
        self
    }

    /// Remote url and key, both required for the remote backend
    pub fn remote_credentials(&self) -> Result<(&str, &str), LaplataError> {
        let url = self
            .remote
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                LaplataError::Config(format!("remote backend needs a url (set {})", URL_ENV))
            })?;
        let key = self
            .remote
            .anon_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LaplataError::Config(format!("remote backend needs a key (set {})", KEY_ENV))
            })?;
        Ok((url, key))
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            source_timeout: Duration::from_millis(self.dashboard.source_timeout_ms),
            low_balance_threshold: self.dashboard.low_balance_threshold,
            recent_limit: self.dashboard.recent_limit,
        }
    }

    /// Set one setting by its dotted key, as `config set` does
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), LaplataError> {
        let invalid = || LaplataError::Config(format!("Invalid value for {}: {}", key, value));
        match key {
            "backend" => self.backend = BackendKind::parse(value).ok_or_else(invalid)?,
            "remote.url" => self.remote.url = Some(value.trim().to_string()),
            "remote.anon_key" => self.remote.anon_key = Some(value.trim().to_string()),
            "currency_symbol" => self.currency_symbol = value.to_string(),
            "date_format" => self.date_format = value.to_string(),
            "log_level" => self.log_level = value.trim().to_string(),
            "dashboard.source_timeout_ms" => {
                self.dashboard.source_timeout_ms = value.trim().parse().map_err(|_| invalid())?
            }
            "dashboard.recent_limit" => {
                self.dashboard.recent_limit = value.trim().parse().map_err(|_| invalid())?
            }
            "dashboard.low_balance_threshold" => {
                self.dashboard.low_balance_threshold = Money::parse(value).map_err(|_| invalid())?
            }
            _ => return Err(LaplataError::Config(format!("Unknown setting: {}", key))),
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.backend, BackendKind::Local);
        assert_eq!(settings.dashboard.source_timeout_ms, 5000);
        assert_eq!(settings.dashboard.recent_limit, 5);
        assert_eq!(
            settings.dashboard.low_balance_threshold,
            Money::from_units(1000)
        );
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LaplataPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.set("backend", "remote").unwrap();
        settings.set("remote.url", "https://demo.example.co").unwrap();
        settings.set("dashboard.source_timeout_ms", "250").unwrap();
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.backend, BackendKind::Remote);
        assert_eq!(loaded.remote.url.as_deref(), Some("https://demo.example.co"));
        assert_eq!(
            loaded.dashboard_options().source_timeout,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"backend":"remote"}"#).unwrap();
        assert_eq!(settings.currency_symbol, "$");
        assert_eq!(settings.dashboard.recent_limit, 5);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut settings = Settings::default();
        assert!(settings.set("backend", "cloud").is_err());
        assert!(settings.set("dashboard.recent_limit", "many").is_err());
        assert!(settings.set("nope", "1").is_err());
    }

    #[test]
    fn test_remote_credentials_required() {
        let settings = Settings::default();
        assert!(matches!(
            settings.remote_credentials(),
            Err(LaplataError::Config(_))
        ));
    }
}
