//! Catalog configuration.
//!
//! # Responsibility
//! - Load backend, listing and logging settings from TOML.
//! - Open the configured `Storager` backend.
//!
//! # Invariants
//! - Every key has a default; an empty document is a valid in-memory config.
//! - `validate()` runs before any backend is opened.

use crate::logging::default_log_level;
use crate::store::{InMemoryStore, SqliteStore, Storager, StoreResult, DEFAULT_MAX_PAGE_SIZE};
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config syntax: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Storage backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Database file; required for the sqlite backend.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    pub max_page_size: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Top-level catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub storage: StorageConfig,
    pub listing: ListingConfig,
    pub logging: LoggingConfig,
}

impl CatalogConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Config for a SQLite catalog file with defaults elsewhere.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                backend: BackendKind::Sqlite,
                path: Some(path.into()),
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == BackendKind::Sqlite && self.storage.path.is_none() {
            return Err(ConfigError::Invalid(
                "storage.path is required when storage.backend = \"sqlite\"".to_string(),
            ));
        }
        if self.listing.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "listing.max_page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Opens the backend selected by `config`.
pub fn open_store(config: &CatalogConfig) -> StoreResult<Arc<dyn Storager>> {
    let max_page_size = config.listing.max_page_size;
    let store: Arc<dyn Storager> = match (config.storage.backend, config.storage.path.as_ref()) {
        (BackendKind::Sqlite, Some(path)) => {
            Arc::new(SqliteStore::open(path)?.with_max_page_size(max_page_size))
        }
        (BackendKind::Sqlite, None) => {
            Arc::new(SqliteStore::open_in_memory()?.with_max_page_size(max_page_size))
        }
        (BackendKind::Memory, _) => Arc::new(InMemoryStore::with_max_page_size(max_page_size)),
    };
    info!(
        "event=store_open module=config status=ok backend={} max_page_size={}",
        store.backend_name(),
        max_page_size
    );
    Ok(store)
}
