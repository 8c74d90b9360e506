use std::path::Path;
use serde::Deserialize;
use anyhow::{bail, Context, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

/// Outbound calls to IMs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamConfig {
    /// Per-request timeout; unset leaves the HTTP client's default (none)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Purge responses captured longer ago than this. Unset never purges.
    #[serde(default)]
    pub prune_after_secs: Option<u64>,
    #[serde(default = "default_maintenance_interval")]
    pub maintenance_interval_secs: u64,
}

fn default_listen() -> String {
    "[::]:5000".to_string()
}

fn default_maintenance_interval() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prune_after_secs: None,
            maintenance_interval_secs: default_maintenance_interval(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;

        if config.cache.maintenance_interval_secs == 0 {
            bail!("cache.maintenance_interval_secs must be at least 1");
        }

        Ok(config)
    }
}
