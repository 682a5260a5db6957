// Configuration management for GridTunes
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::spotify::ClientInfo;

pub const ENV_CLIENT_ID: &str = "GRIDTUNES_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "GRIDTUNES_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "GRIDTUNES_REDIRECT_URI";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub spotify: SpotifyConfig,
    pub network: NetworkConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub market: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub auth_timeout_secs: u64,
    pub refresh_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub max_log_entries: usize,
    pub playlist_page_size: u32,
}

fn app_dir() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gridtunes")
}

impl Default for Config {
    fn default() -> Self {
        let app_dir = app_dir();
        Self {
            database_path: app_dir.join("gridtunes.db"),
            log_dir: app_dir.join("logs"),
            spotify: SpotifyConfig::default(),
            network: NetworkConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: "http://127.0.0.1:8888/callback".to_string(),
            market: "US".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            auth_timeout_secs: 60,
            refresh_timeout_secs: 30,
            settle_delay_ms: 50,
            poll_interval_ms: 1000,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            max_log_entries: 50,
            playlist_page_size: 20,
        }
    }
}

impl NetworkConfig {
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reads `path`, writing the defaults there first if it does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Environment wins over the file. Takes a lookup so tests stay hermetic.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup(ENV_CLIENT_ID).filter(|v| !v.is_empty()) {
            self.spotify.client_id = Some(id);
        }
        if let Some(secret) = lookup(ENV_CLIENT_SECRET).filter(|v| !v.is_empty()) {
            self.spotify.client_secret = Some(secret);
        }
        if let Some(uri) = lookup(ENV_REDIRECT_URI).filter(|v| !v.is_empty()) {
            self.spotify.redirect_uri = uri;
        }
    }

    /// Client registration as configured. Missing pieces come through empty
    /// and get reported by `ClientInfo::validate`.
    pub fn client_info(&self) -> ClientInfo {
        ClientInfo::new(
            self.spotify.client_id.clone().unwrap_or_default(),
            self.spotify.client_secret.clone().unwrap_or_default(),
            self.spotify.redirect_uri.clone(),
        )
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("gridtunes");

        Ok(config_dir.join("config.toml"))
    }
}
