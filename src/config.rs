use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::CacheOptions;
use crate::nav::DexRange;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheConfig,
  pub retry: RetryConfig,
  /// Dex numbers that can be browsed
  pub dex: DexRange,
  /// Directory for the log file (defaults to the user data directory)
  pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://pokeapi.co/api/v2".to_string(),
      timeout_secs: 10,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Seconds fetched data is served without refetching
  pub stale_time_secs: u64,
  /// Seconds an unused entry is kept; omit or null to keep entries forever
  pub gc_time_secs: Option<u64>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: 300,
      gc_time_secs: Some(300),
    }
  }
}

/// `None` when `secs` doesn't fit a chrono duration.
fn seconds(secs: u64) -> Option<chrono::Duration> {
  i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}

// Out-of-range values are rejected by `Config::validate`; saturate here.
impl From<&CacheConfig> for CacheOptions {
  fn from(config: &CacheConfig) -> Self {
    Self {
      stale_time: seconds(config.stale_time_secs).unwrap_or_else(chrono::Duration::max_value),
      gc_time: config
        .gc_time_secs
        .map(|secs| seconds(secs).unwrap_or_else(chrono::Duration::max_value)),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  /// Retries after the first attempt; 0 disables retrying
  pub max_retries: u32,
  pub base_delay_ms: u64,
  pub max_delay_ms: u64,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_retries: 3,
      base_delay_ms: 1_000,
      max_delay_ms: 30_000,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./pokedex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/pokedex/config.yaml
  ///
  /// Without any file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("pokedex.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("pokedex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to load config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    self.dex.validate()?;
    if self.api.timeout_secs == 0 {
      return Err(eyre!("api.timeout_secs must be greater than zero"));
    }
    if seconds(self.cache.stale_time_secs).is_none() {
      return Err(eyre!(
        "cache.stale_time_secs is out of range: {}",
        self.cache.stale_time_secs
      ));
    }
    if let Some(secs) = self.cache.gc_time_secs {
      if seconds(secs).is_none() {
        return Err(eyre!("cache.gc_time_secs is out of range: {}", secs));
      }
    }
    Ok(())
  }

  /// Directory the log file is written to.
  pub fn log_dir(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.log_dir {
      return Ok(dir.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("pokedex"))
  }
}
