//! Storage contract and backends.
//!
//! # Responsibility
//! - Define the `Storager` capability set: create/get/update/delete/list for
//!   every entity kind plus the note ↔ occurrence lookups.
//! - Provide the in-memory reference backend and the SQLite backend.
//!
//! # Invariants
//! - A canonical name maps to at most one live entity per kind.
//! - Create never overwrites; update and delete never create.
//! - Every operation is all-or-nothing. A failed call leaves state untouched.
//! - Occurrence writes and the note relationship index change together.
//!
//! # See also
//! - `crate::name` for the canonical name grammar backends key on.

pub mod filter;
pub mod index;
pub mod memory;
pub mod page;
pub mod sqlite;
pub mod table;

use crate::db::DbError;
use crate::model::note::Note;
use crate::model::occurrence::Occurrence;
use crate::model::operation::Operation;
use crate::model::project::Project;
use crate::model::{ModelValidationError, Resource};
use crate::name::{NameError, ResourceKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use filter::Filter;
pub use index::RelationshipIndex;
pub use memory::InMemoryStore;
pub use page::{ListRequest, Page, DEFAULT_MAX_PAGE_SIZE};
pub use sqlite::SqliteStore;
pub use table::EntityTable;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure returned by every `Storager` operation.
#[derive(Debug)]
pub enum StoreError {
    /// Create of a name that is already present.
    AlreadyExists { kind: ResourceKind, name: String },
    /// Read/update/delete of an absent name, or a reference to a missing note.
    NotFound { kind: ResourceKind, name: String },
    /// A pre-populated resource name does not parse.
    InvalidName(NameError),
    /// Payload rejected by model validation.
    Validation(ModelValidationError),
    /// Page token was not produced by this engine.
    InvalidPageToken(String),
    /// A writer panicked while holding an in-memory table lock.
    LockPoisoned(&'static str),
    Db(DbError),
    /// Persisted state cannot be decoded into a valid entity.
    InvalidData(String),
}

/// Transport-neutral classification of a `StoreError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    Internal,
}

impl StatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::InvalidArgument => "invalid_argument",
            Self::Internal => "internal",
        }
    }
}

impl StoreError {
    pub(crate) fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn already_exists(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    pub fn code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NotFound,
            Self::AlreadyExists { .. } => StatusCode::AlreadyExists,
            Self::InvalidName(_) | Self::Validation(_) | Self::InvalidPageToken(_) => {
                StatusCode::InvalidArgument
            }
            Self::LockPoisoned(_) | Self::Db(_) | Self::InvalidData(_) => StatusCode::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExists { kind, name } => write!(f, "{kind} already exists: {name}"),
            Self::NotFound { kind, name } => write!(f, "{kind} not found: {name}"),
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "invalid payload: {err}"),
            Self::InvalidPageToken(token) => write!(f, "invalid page token `{token}`"),
            Self::LockPoisoned(context) => write!(f, "poisoned lock: {context}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NameError> for StoreError {
    fn from(value: NameError) -> Self {
        Self::InvalidName(value)
    }
}

impl From<ModelValidationError> for StoreError {
    fn from(value: ModelValidationError) -> Self {
        match value {
            ModelValidationError::Name(err) => Self::InvalidName(err),
            other => Self::Validation(other),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// The storage contract every catalog backend implements.
///
/// Methods take `&self`; backends synchronize internally so one instance can
/// be shared across request handlers behind an `Arc`.
pub trait Storager: Send + Sync {
    /// Short backend label for diagnostics.
    fn backend_name(&self) -> &'static str;

    fn create_project(&self, project_id: &str) -> StoreResult<Project>;
    fn get_project(&self, project_id: &str) -> StoreResult<Project>;
    fn delete_project(&self, project_id: &str) -> StoreResult<()>;
    fn list_projects(&self, request: &ListRequest) -> StoreResult<Page<Project>>;

    fn create_note(&self, note: &Note) -> StoreResult<()>;
    fn get_note(&self, project_id: &str, note_id: &str) -> StoreResult<Note>;
    fn update_note(&self, project_id: &str, note_id: &str, note: &Note) -> StoreResult<()>;
    fn delete_note(&self, project_id: &str, note_id: &str) -> StoreResult<()>;
    fn list_notes(&self, project_id: &str, request: &ListRequest) -> StoreResult<Page<Note>>;

    /// Fails with `NotFound` when `occurrence.note_name` does not exist.
    fn create_occurrence(&self, occurrence: &Occurrence) -> StoreResult<()>;
    fn get_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<Occurrence>;
    fn update_occurrence(
        &self,
        project_id: &str,
        occurrence_id: &str,
        occurrence: &Occurrence,
    ) -> StoreResult<()>;
    fn delete_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<()>;
    fn list_occurrences(
        &self,
        project_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Occurrence>>;

    /// Resolves the note an occurrence references.
    fn get_note_by_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<Note>;
    /// Lists every occurrence referencing the note, across all projects.
    fn list_note_occurrences(
        &self,
        project_id: &str,
        note_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Occurrence>>;

    fn create_operation(&self, operation: &Operation) -> StoreResult<()>;
    fn get_operation(&self, project_id: &str, operation_id: &str) -> StoreResult<Operation>;
    fn update_operation(
        &self,
        project_id: &str,
        operation_id: &str,
        operation: &Operation,
    ) -> StoreResult<()>;
    fn delete_operation(&self, project_id: &str, operation_id: &str) -> StoreResult<()>;
    fn list_operations(
        &self,
        project_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Operation>>;
}

/// Validates a replacement payload against the addressed name.
pub(crate) fn check_replacement<T: Resource>(addressed: &str, value: &T) -> StoreResult<()> {
    value.validate()?;
    if value.name() != addressed {
        return Err(StoreError::Validation(ModelValidationError::NameMismatch {
            expected: addressed.to_string(),
            actual: value.name().to_string(),
        }));
    }
    Ok(())
}
