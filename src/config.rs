//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which is just the content API base URL and an optional data directory
//! override for the location store.
//!
//! Configuration is stored at `~/.config/gymcache/config.json`. The base URL
//! can also come from a `.env` file or the `GYMCACHE_API_BASE_URL`
//! environment variable, which wins over the file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "gymcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
const ENV_API_BASE_URL: &str = "GYMCACHE_API_BASE_URL";

/// Fallback for local development against a dev API server
const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Pick up a .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
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

    /// Effective API base URL: environment variable, then config file, then
    /// the development default.
    pub fn api_base_url(&self) -> String {
        std::env::var(ENV_API_BASE_URL)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// Directory for persisted client state (the saved viewer location).
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_prefers_config_over_default() {
        let config = Config {
            api_base_url: Some("https://api.example.com".into()),
            data_dir: None,
        };
        // The env override is unset in tests, so the file value wins.
        if std::env::var(ENV_API_BASE_URL).is_err() {
            assert_eq!(config.api_base_url(), "https://api.example.com");
            assert_eq!(Config::default().api_base_url(), DEFAULT_API_BASE_URL);
        }
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config {
            api_base_url: None,
            data_dir: Some(PathBuf::from("/tmp/gymcache-test")),
        };
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/gymcache-test"));
    }
}
