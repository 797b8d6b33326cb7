//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the database URL, unit name and the offline flag.
//!
//! Configuration is stored at `~/.config/flightline/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "flightline";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured database URL
pub const DATABASE_URL_ENV: &str = "FLIGHTLINE_DATABASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub offline_mode: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Database URL from the environment, else from the config file.
    pub fn database_url(&self) -> Option<String> {
        resolve_database_url(std::env::var(DATABASE_URL_ENV).ok(), self.database_url.as_deref())
    }

    /// Per-database cache directory, so two rosters never share snapshots.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;

        let mut path = cache_dir.join(APP_NAME);
        if let Some(url) = self.database_url() {
            path = path.join(sanitize_host(&url));
        }
        Ok(path)
    }
}

fn resolve_database_url(env: Option<String>, configured: Option<&str>) -> Option<String> {
    env.or_else(|| configured.map(str::to_string))
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Host part of a URL, reduced to characters safe in a directory name.
fn sanitize_host(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host = without_scheme.split('/').next().unwrap_or_default();
    let cleaned: String = host
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}
