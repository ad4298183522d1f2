//! Catalog domain model.
//!
//! # Responsibility
//! - Define the four persisted entity kinds: project, note, occurrence and
//!   operation.
//! - Provide write-path validation shared by every storage backend.
//!
//! # Invariants
//! - Every entity is identified by its canonical resource name.
//! - Updates replace an entity wholesale; there is no field-level patching.
//!
//! # See also
//! - `crate::store` for where `Resource::validate` runs.

pub mod note;
pub mod occurrence;
pub mod operation;
pub mod project;

use crate::name::{NameError, ResourceKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Common surface of every entity kept in a storage table.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Entity kind stored under this type.
    const KIND: ResourceKind;

    /// Canonical resource name (the table key).
    fn name(&self) -> &str;

    /// Checks write-path invariants before persistence.
    fn validate(&self) -> Result<(), ModelValidationError>;
}

/// Validation failure for an entity payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValidationError {
    /// A name field does not parse as the expected kind.
    Name(NameError),
    /// A required string field is blank.
    EmptyField(&'static str),
    /// CVSS scores must be finite and in `0.0..=10.0`.
    InvalidCvssScore { field: &'static str, value: f32 },
    /// A replacement payload names a different entity than the one addressed.
    NameMismatch { expected: String, actual: String },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(err) => write!(f, "{err}"),
            Self::EmptyField(field) => write!(f, "`{field}` must not be empty"),
            Self::InvalidCvssScore { field, value } => {
                write!(f, "`{field}` must be within 0.0..=10.0, got {value}")
            }
            Self::NameMismatch { expected, actual } => {
                write!(f, "payload name `{actual}` does not match addressed `{expected}`")
            }
        }
    }
}

impl Error for ModelValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Name(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NameError> for ModelValidationError {
    fn from(value: NameError) -> Self {
        Self::Name(value)
    }
}

pub(crate) fn validate_cvss(field: &'static str, value: f32) -> Result<(), ModelValidationError> {
    if value.is_finite() && (0.0..=10.0).contains(&value) {
        Ok(())
    } else {
        Err(ModelValidationError::InvalidCvssScore { field, value })
    }
}

pub(crate) fn require_non_blank(
    field: &'static str,
    value: &str,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        Err(ModelValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

/// Severity shared by vulnerability notes and occurrences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Unspecified,
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

/// Kind of finding described by a note and carried by its occurrences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    #[default]
    Unspecified,
    PackageVulnerability,
    BuildDetails,
    ImageBasis,
    PackageManager,
    Deployable,
    Discovery,
    Attestation,
}
