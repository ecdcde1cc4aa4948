//! Core runtime configuration.
//!
//! # Responsibility
//! - Load storage and logging settings from an optional TOML file.
//! - Apply `REVIEWDESK_*` environment overrides on top of file values.
//!
//! # Invariants
//! - Missing files and missing keys fall back to defaults.
//! - Unknown keys and unsupported log levels are rejected.

use crate::logging::{default_log_level, init_logging, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_FILE_NAME: &str = "data.db";
pub const ENV_DB_PATH: &str = "REVIEWDESK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "REVIEWDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "REVIEWDESK_LOG_DIR";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Settings needed to open the store and start logging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Snapshot file backing the storage engine.
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute log directory; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Parses TOML text and validates it.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: CoreConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides fields from `lookup`, typically `std::env::var`.
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|value| !value.trim().is_empty()) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|value| !value.trim().is_empty()) {
            self.log_level = level;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|value| !value.trim().is_empty()) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        self.validate()?;
        Ok(self)
    }

    /// Starts file logging when `log_dir` is configured.
    pub fn init_logging(&self) -> Result<(), String> {
        match &self.log_dir {
            Some(dir) => init_logging(&self.log_level, dir),
            None => Ok(()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
        }
        normalize_level(&self.log_level).map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<CoreConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    CoreConfig::from_toml_str(&text, path)
}

/// Loads `path` when given, else defaults, then applies environment overrides.
pub fn load_config_or_default(path: Option<&Path>) -> Result<CoreConfig, ConfigError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => CoreConfig::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok())
}
