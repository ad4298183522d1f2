//! Catalog database bootstrap.
//!
//! `open_db*` hands out connections that the SQLite store can use as-is:
//! pragmas set, every pending migration applied, and the entity tables
//! (`projects`, `notes`, `occurrences`, `operations`) confirmed present.
//! Schema version lives in `PRAGMA user_version`; a file written by a newer
//! build is refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating a catalog database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file records a schema version this build has no migrations for.
    SchemaTooNew { found: u32, supported: u32 },
    /// Migrations finished but an entity table is absent.
    MissingTable(&'static str),
}

impl DbError {
    /// Whether the database must be opened by a newer build.
    pub fn is_schema_too_new(&self) -> bool {
        matches!(self, Self::SchemaTooNew { .. })
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "catalog schema v{found} is ahead of this build (supports up to v{supported})"
            ),
            Self::MissingTable(table) => {
                write!(f, "catalog database has no `{table}` table after migration")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
