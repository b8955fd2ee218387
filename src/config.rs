//! Service configuration: defaults, optional TOML file, environment overrides.
//! `MUSEUMHUB_CONFIG` names the TOML file; every other variable overrides a
//! single field after the file is applied.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// SQLite translation cache.
    pub cache_db_path: PathBuf,
    /// JSON file holding per-page original texts.
    pub originals_path: PathBuf,
    /// In-memory tier in front of SQLite.
    pub memory_cache_capacity: usize,
    pub worker_count: usize,
    pub item_timeout_secs: u64,
    /// Pause between two backends of the fallback chain.
    pub backend_pause_ms: u64,
    pub libre: LibreConfig,
    pub deepseek_api_key: Option<String>,
    pub log_json: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibreConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Minimum spacing between two requests to the same instance.
    pub min_interval_ms: u64,
}

impl Default for LibreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".into(),
            api_key: None,
            min_interval_ms: 50,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            cache_db_path: PathBuf::from("translations.db"),
            originals_path: PathBuf::from("original_texts.json"),
            memory_cache_capacity: 2048,
            worker_count: 5,
            item_timeout_secs: 10,
            backend_pause_ms: 100,
            libre: LibreConfig::default(),
            deepseek_api_key: None,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Defaults, then `MUSEUMHUB_CONFIG` (if set), then single-field env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var("MUSEUMHUB_CONFIG") {
            Ok(path) => Self::load_from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let cfg = Self::from_toml(&content)?;
        info!(path = %path.display(), "config file loaded");
        Ok(cfg)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("MUSEUMHUB_BIND") {
            self.bind_addr = v.parse().map_err(|e| ConfigError::Invalid {
                key: "MUSEUMHUB_BIND",
                reason: format!("{e}"),
            })?;
        }
        if let Ok(v) = std::env::var("MUSEUMHUB_CACHE_DB") {
            self.cache_db_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MUSEUMHUB_ORIGINALS") {
            self.originals_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MUSEUMHUB_WORKERS") {
            self.worker_count = parse_number("MUSEUMHUB_WORKERS", &v)?;
        }
        if let Ok(v) = std::env::var("MUSEUMHUB_ITEM_TIMEOUT_SECS") {
            self.item_timeout_secs = parse_number("MUSEUMHUB_ITEM_TIMEOUT_SECS", &v)?;
        }
        if let Ok(v) = std::env::var("LIBRETRANSLATE_URL") {
            self.libre.base_url = v;
        }
        if let Ok(v) = std::env::var("LIBRETRANSLATE_API_KEY") {
            self.libre.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("DEEPSEEK_API_KEY") {
            self.deepseek_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("MUSEUMHUB_LOG_FORMAT") {
            self.log_json = v.eq_ignore_ascii_case("json");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid {
                key: "worker_count",
                reason: "must be at least 1".into(),
            });
        }
        if self.item_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "item_timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        if self.memory_cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "memory_cache_capacity",
                reason: "must be at least 1".into(),
            });
        }
        let url = &self.libre.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: "libre.base_url",
                reason: format!("not an http(s) URL: {}", self.libre.base_url),
            });
        }
        Ok(())
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }

    pub fn backend_pause(&self) -> Duration {
        Duration::from_millis(self.backend_pause_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
