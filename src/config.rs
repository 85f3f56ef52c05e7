// src/config.rs

//! Runtime settings: built-in defaults, then an optional TOML file, then
//! credentials from the environment.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::poll::PollConfig;

pub const CONFIG_PATH_ENV: &str = "VULNSCAN_CONFIG";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// --- Provider Settings ---

/// Credential and endpoint override for one provider. A `None` base URL
/// means the provider's public endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "gemini-2.0-flash".to_string(),
        }
    }
}

// --- Behaviour Settings ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_secs: u64,
    pub max_attempts: u32,
    pub backoff_multiplier: f64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: 10,
            backoff_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Overall budget for one scan. `None` lets every provider run to its own
    /// poll limit.
    pub deadline_secs: Option<u64>,
    /// Keywords searched in the CVE database on every scan.
    pub cve_keywords: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            deadline_secs: Some(180),
            cve_keywords: vec!["apache".to_string(), "nginx".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: Some(3600),
        }
    }
}

// --- Top Level ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub http: HttpSettings,
    pub polling: PollingSettings,
    pub scan: ScanSettings,
    pub cache: CacheSettings,
    pub virustotal: ProviderSettings,
    pub safe_browsing: ProviderSettings,
    pub ssl_labs: ProviderSettings,
    pub observatory: ProviderSettings,
    pub api_ninjas: ProviderSettings,
    pub nvd: ProviderSettings,
    pub summarizer: SummarizerSettings,
}

impl Settings {
    /// Loads settings from the config file (if any) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut settings = Self::read_config(explicit, default_config_path())?;
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    /// Reads the config file. A file named explicitly must exist; the default
    /// location is optional.
    pub fn read_config(explicit: Option<PathBuf>, default_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(&path);
        }
        match default_path {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No config file found, using defaults.");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded config file.");
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Overrides credentials from environment variables. `lookup` returns the
    /// value of a variable, if set. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("VIRUSTOTAL_API_KEY") {
            self.virustotal.api_key = Some(key);
        }
        // The Safe Browsing API accepts any Google Cloud key, so the
        // summarizer's key is a valid fallback.
        if let Some(key) = get("SAFE_BROWSING_API_KEY").or_else(|| get("GEMINI_API_KEY")) {
            self.safe_browsing.api_key = Some(key);
        }
        if let Some(key) = get("API_NINJAS_KEY") {
            self.api_ninjas.api_key = Some(key);
        }
        if let Some(key) = get("NVD_API_KEY") {
            self.nvd.api_key = Some(key);
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.summarizer.api_key = Some(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.summarizer.model = model;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.polling.interval_secs),
            max_attempts: self.polling.max_attempts,
            backoff_multiplier: self.polling.backoff_multiplier,
        }
    }

    pub fn scan_deadline(&self) -> Option<Duration> {
        self.scan.deadline_secs.map(Duration::from_secs)
    }

    pub fn cache_ttl(&self) -> Option<chrono::Duration> {
        self.cache
            .ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .map(chrono::Duration::seconds)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "vulnscan-rs", env!("CARGO_PKG_NAME")).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
