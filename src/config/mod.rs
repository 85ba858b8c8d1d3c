//! Configuration storage

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the backend URL.
pub const API_URL_ENV: &str = "CLOUD_TUTOR_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the assistant backend
    pub api_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "cloud-tutor", "cloud-tutor")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config file")?;
        config.validate().context("Invalid config file")?;
        Ok(config)
    }

    /// Reject values the HTTP client cannot work with.
    pub fn validate(&self) -> Result<()> {
        check_timeout(self.request_timeout_secs)
    }

    /// Load from disk, then apply the environment and command-line overrides.
    ///
    /// Precedence: flag > environment > file > default.
    pub fn resolve(api_url_flag: Option<String>) -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(std::env::var(API_URL_ENV).ok(), api_url_flag);
        Ok(config)
    }

    fn apply_overrides(&mut self, env_url: Option<String>, flag_url: Option<String>) {
        if let Some(url) = flag_url.or(env_url).filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;
        Ok(())
    }
}

fn check_timeout(secs: u64) -> Result<()> {
    if secs == 0 {
        bail!("request_timeout_secs must be at least 1");
    }
    Ok(())
}

/// Show or update the stored configuration (prints to stdout).
pub fn show_or_update(set_api_url: Option<String>, set_timeout: Option<u64>) -> Result<()> {
    if let Some(secs) = set_timeout {
        check_timeout(secs)?;
    }
    let path = Config::config_path()?;

    if set_api_url.is_none() && set_timeout.is_none() {
        let effective = Config::resolve(None)?;
        println!("Config file: {}", path.display());
        println!("  api_url:              {}", effective.api_url);
        println!("  request_timeout_secs: {}", effective.request_timeout_secs);
        return Ok(());
    }

    let mut stored = Config::load()?;
    if let Some(url) = set_api_url {
        stored.api_url = url;
    }
    if let Some(secs) = set_timeout {
        stored.request_timeout_secs = secs;
    }
    stored.save()?;
    tracing::info!("Saved config to {}", path.display());
    Ok(())
}
