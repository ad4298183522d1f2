//! Core storage engine for the supply-chain metadata catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod name;
pub mod service;
pub mod store;

pub use config::{open_store, BackendKind, CatalogConfig, ConfigError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::note::Note;
pub use model::occurrence::Occurrence;
pub use model::operation::{Operation, OperationResult, OperationStatus};
pub use model::project::Project;
pub use model::{ModelValidationError, Resource};
pub use name::{NameError, ResourceKind};
pub use service::catalog_service::CatalogService;
pub use store::{
    InMemoryStore, ListRequest, Page, SqliteStore, StatusCode, StoreError, StoreResult, Storager,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
