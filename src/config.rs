use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::CACHE_TTL_SECS;

/// Public demo API serving the todo collection
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/";

/// Upper bound for the cache TTL (one year)
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the todo API; `todos` and `todos/{id}` are resolved against it
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Request timeout. Unset means the HTTP client default.
  pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: None,
    }
  }
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
  /// Serve fresh cached data, refresh stale data, fall back to stale data on failure
  #[default]
  CacheAside,
  /// No caching - every request goes to the API
  Passthrough,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub policy: CachePolicy,
  /// How long cached data is considered fresh
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      policy: CachePolicy::default(),
      ttl_secs: default_ttl_secs(),
    }
  }
}

fn default_ttl_secs() -> u64 {
  CACHE_TTL_SECS as u64
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::seconds(self.ttl_secs.min(MAX_TTL_SECS) as i64)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Default filter directive; RUST_LOG takes precedence
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Write logs to `todos.log` in this directory instead of stderr
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      dir: None,
    }
  }
}

fn default_log_level() -> String {
  "warn".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./todos.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/todos/config.yaml
  ///
  /// No file at all means built-in defaults. `TODOS_BASE_URL` overrides the
  /// base URL from any source.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Some(url) = Self::get_base_url_override() {
      config.api.base_url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("todos.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("todos").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }

    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// Get the base URL override from the environment.
  ///
  /// Checks TODOS_BASE_URL.
  fn get_base_url_override() -> Option<String> {
    std::env::var("TODOS_BASE_URL")
      .ok()
      .filter(|url| !url.trim().is_empty())
  }
}
