use serde::{Deserialize, Serialize};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ErrorCode;
use crate::ingest::DEFAULT_DELIMITER;

/// Environment variable naming a config file to load.
pub const CONFIG_ENV: &str = "ROUTECYCLE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

impl IngestConfig {
    /// Reject delimiters that can never split a trimmed line.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDelimiter`] for whitespace delimiters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delimiter.is_whitespace() {
            return Err(ConfigError::InvalidDelimiter(self.delimiter));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            chunk_size: default_chunk_size(),
            progress: default_true(),
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid delimiter {0:?}: whitespace is trimmed from every line")]
    InvalidDelimiter(char),
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Parse { .. } => ErrorCode::ConfigParseError,
            Self::InvalidDelimiter(_) => ErrorCode::InvalidDelimiter,
        }
    }
}

/// Load and validate a config file that must exist.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, parsed, or validated.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = toml::from_str::<Config>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.ingest.validate()?;
    Ok(config)
}

/// Resolve and load the effective config.
///
/// Precedence (highest wins):
/// 1. `explicit` path (must exist)
/// 2. `ROUTECYCLE_CONFIG` env var (must exist)
/// 3. `<user config dir>/routecycle/config.toml` if present
/// 4. Built-in defaults
///
/// # Errors
///
/// Returns [`ConfigError`] if a selected file cannot be loaded.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let env_path = env::var_os(CONFIG_ENV).map(PathBuf::from);
    let user_path = dirs::config_dir().map(|dir| dir.join("routecycle/config.toml"));

    match resolve_config_path(explicit, env_path, user_path) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config_file(&path)
        }
        None => Ok(Config::default()),
    }
}

fn resolve_config_path(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    user_path: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    user_path.filter(|p| p.exists())
}

const fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_chunk_size() -> usize {
    8192
}

const fn default_true() -> bool {
    true
}
