//! Canonical resource names.
//!
//! # Responsibility
//! - Format `(project_id, local_id)` pairs into hierarchical resource names.
//! - Parse resource names back into their id segments.
//!
//! # Invariants
//! - `parse_*(format_*(ids)) == ids` for any ids without `/`.
//! - Id segments are never empty and never contain `/`.
//!
//! # See also
//! - `crate::model` for the entities these names identify.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PROJECTS_COLLECTION: &str = "projects";

static PROJECT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^projects/([^/]+)$").expect("valid project name regex"));
static NOTE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^projects/([^/]+)/notes/([^/]+)$").expect("valid note name regex"));
static OCCURRENCE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^projects/([^/]+)/occurrences/([^/]+)$").expect("valid occurrence name regex")
});
static OPERATION_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^projects/([^/]+)/operations/([^/]+)$").expect("valid operation name regex")
});

/// Entity kinds addressable by canonical resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Note,
    Occurrence,
    Operation,
}

impl ResourceKind {
    /// Stable lowercase label used in errors and log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Note => "note",
            Self::Occurrence => "occurrence",
            Self::Operation => "operation",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to decompose a resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    Malformed { kind: ResourceKind, value: String },
}

impl Display for NameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { kind, value } => {
                write!(f, "malformed {kind} name: `{value}`")
            }
        }
    }
}

impl Error for NameError {}

pub type NameResult<T> = Result<T, NameError>;

/// Formats `projects/{project_id}`.
pub fn format_project(project_id: &str) -> String {
    format!("{PROJECTS_COLLECTION}/{project_id}")
}

/// Formats `projects/{project_id}/notes/{note_id}`.
pub fn format_note(project_id: &str, note_id: &str) -> String {
    format!("{PROJECTS_COLLECTION}/{project_id}/notes/{note_id}")
}

/// Formats `projects/{project_id}/occurrences/{occurrence_id}`.
pub fn format_occurrence(project_id: &str, occurrence_id: &str) -> String {
    format!("{PROJECTS_COLLECTION}/{project_id}/occurrences/{occurrence_id}")
}

/// Formats `projects/{project_id}/operations/{operation_id}`.
pub fn format_operation(project_id: &str, operation_id: &str) -> String {
    format!("{PROJECTS_COLLECTION}/{project_id}/operations/{operation_id}")
}

/// Returns the prefix shared by every child resource of one project.
///
/// Includes the trailing `/` so `projects/a` never matches `projects/ab/...`.
pub fn project_scope_prefix(project_id: &str) -> String {
    format!("{}/", format_project(project_id))
}

/// Parses a project name into its project id.
pub fn parse_project(name: &str) -> NameResult<String> {
    PROJECT_NAME_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| malformed(ResourceKind::Project, name))
}

/// Parses a note name into `(project_id, note_id)`.
pub fn parse_note(name: &str) -> NameResult<(String, String)> {
    parse_child(&NOTE_NAME_RE, ResourceKind::Note, name)
}

/// Parses an occurrence name into `(project_id, occurrence_id)`.
pub fn parse_occurrence(name: &str) -> NameResult<(String, String)> {
    parse_child(&OCCURRENCE_NAME_RE, ResourceKind::Occurrence, name)
}

/// Parses an operation name into `(project_id, operation_id)`.
pub fn parse_operation(name: &str) -> NameResult<(String, String)> {
    parse_child(&OPERATION_NAME_RE, ResourceKind::Operation, name)
}

/// Parses a name of the given kind and returns its project id.
pub fn project_id_of(kind: ResourceKind, name: &str) -> NameResult<String> {
    match kind {
        ResourceKind::Project => parse_project(name),
        ResourceKind::Note => parse_note(name).map(|(project_id, _)| project_id),
        ResourceKind::Occurrence => parse_occurrence(name).map(|(project_id, _)| project_id),
        ResourceKind::Operation => parse_operation(name).map(|(project_id, _)| project_id),
    }
}

fn parse_child(re: &Regex, kind: ResourceKind, name: &str) -> NameResult<(String, String)> {
    let caps = re.captures(name).ok_or_else(|| malformed(kind, name))?;
    match (caps.get(1), caps.get(2)) {
        (Some(project), Some(local)) => {
            Ok((project.as_str().to_string(), local.as_str().to_string()))
        }
        _ => Err(malformed(kind, name)),
    }
}

fn malformed(kind: ResourceKind, value: &str) -> NameError {
    NameError::Malformed {
        kind,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_name_parses_back_to_ids() {
        let name = format_note("vulnerability-scanner-a", "CVE-1999-0710");
        assert_eq!(name, "projects/vulnerability-scanner-a/notes/CVE-1999-0710");
        let (project_id, note_id) = parse_note(&name).unwrap();
        assert_eq!(project_id, "vulnerability-scanner-a");
        assert_eq!(note_id, "CVE-1999-0710");
    }

    #[test]
    fn parse_rejects_wrong_collection() {
        let name = format_occurrence("p", "o");
        let err = parse_note(&name).unwrap_err();
        assert_eq!(
            err,
            NameError::Malformed {
                kind: ResourceKind::Note,
                value: name,
            }
        );
    }

    #[test]
    fn parse_rejects_empty_and_nested_segments() {
        assert!(parse_project("projects/").is_err());
        assert!(parse_project("projects/a/b").is_err());
        assert!(parse_operation("projects//operations/x").is_err());
        assert!(parse_occurrence("projects/p/occurrences/").is_err());
    }

    #[test]
    fn scope_prefix_does_not_match_longer_project_ids() {
        let prefix = project_scope_prefix("findThese");
        assert!(format_note("findThese", "1").starts_with(&prefix));
        assert!(!format_note("findTheseToo", "1").starts_with(&prefix));
    }

    #[test]
    fn project_id_of_dispatches_on_kind() {
        let name = format_operation("ops", "42");
        assert_eq!(project_id_of(ResourceKind::Operation, &name).unwrap(), "ops");
        assert!(project_id_of(ResourceKind::Note, &name).is_err());
    }
}
