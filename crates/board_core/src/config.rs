use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
// transport retries are opt-in and only apply to GET requests
const DEFAULT_MAX_RETRIES: u32 = 0;
const CONFIG_FILE_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid API url '{0}': expected an http:// or https:// url")]
    InvalidApiUrl(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub http_proxy: String,
    #[serde(default)]
    pub https_proxy: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Overridden base urls must point at the `/api` root.
pub fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api")
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: default_api_url(),
            http_proxy: String::new(),
            https_proxy: String::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: None,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load from ~/.job-board/config.json, falling back to ./config.toml,
    /// then apply environment overrides.
    pub fn new() -> Self {
        let mut config = Self::load_from(&paths::config_json_path(), Path::new(CONFIG_FILE_PATH));
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Unreadable or malformed files are skipped.
    pub fn load_from(json_path: &Path, toml_path: &Path) -> Self {
        if json_path.exists() {
            match Self::read_json(json_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring {}: {}", json_path.display(), e),
            }
        }

        if toml_path.exists() {
            match Self::read_toml(toml_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring {}: {}", toml_path.display(), e),
            }
        }

        Config::default()
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn read_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_url) = lookup("JOB_BOARD_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api_url = normalize_api_url(&api_url);
        }
        if let Some(http_proxy) = lookup("HTTP_PROXY") {
            self.http_proxy = http_proxy;
        }
        if let Some(https_proxy) = lookup("HTTPS_PROXY") {
            self.https_proxy = https_proxy;
        }
        if let Some(retries) = lookup("JOB_BOARD_MAX_RETRIES").and_then(|v| v.trim().parse().ok()) {
            self.max_retries = retries;
        }
        if let Some(timeout) = lookup("JOB_BOARD_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            self.timeout_secs = Some(timeout);
        }
        if let Some(dir) = lookup("JOB_BOARD_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidApiUrl(self.api_url.clone()))
        }
    }

    /// Base url without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(paths::app_dir)
    }
}
