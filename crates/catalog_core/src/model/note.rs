//! Note model.
//!
//! # Responsibility
//! - Describe one class of finding, authored once and referenced by many
//!   occurrences.
//!
//! # Invariants
//! - `name` parses as a note name.
//! - `vulnerability_type.cvss_score` stays within `0.0..=10.0`.

use crate::model::{validate_cvss, ModelValidationError, NoteKind, Resource, Severity};
use crate::name::{format_note, parse_note, ResourceKind};
use serde::{Deserialize, Serialize};

/// Finding template, e.g. one CVE definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// `projects/{project_id}/notes/{note_id}`.
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub kind: NoteKind,
    /// Present for `NoteKind::PackageVulnerability` notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerability_type: Option<VulnerabilityType>,
    #[serde(default)]
    pub related_url: Vec<RelatedUrl>,
}

/// Vulnerability payload of a note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityType {
    pub cvss_score: f32,
    pub severity: Severity,
    #[serde(default)]
    pub details: Vec<VulnerabilityDetail>,
}

/// Per-package description of where a vulnerability applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityDetail {
    pub cpe_uri: String,
    pub package: String,
    pub severity_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_affected_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,
}

/// Reference link attached to a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedUrl {
    pub url: String,
    pub label: String,
}

impl Note {
    /// Creates an empty note with its name formatted from ids.
    pub fn new(project_id: &str, note_id: &str) -> Self {
        Self {
            name: format_note(project_id, note_id),
            ..Self::default()
        }
    }

    /// Returns `(project_id, note_id)`.
    pub fn ids(&self) -> Result<(String, String), ModelValidationError> {
        Ok(parse_note(&self.name)?)
    }
}

impl Resource for Note {
    const KIND: ResourceKind = ResourceKind::Note;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ModelValidationError> {
        parse_note(&self.name)?;
        if let Some(vulnerability) = self.vulnerability_type.as_ref() {
            validate_cvss("vulnerability_type.cvss_score", vulnerability.cvss_score)?;
        }
        Ok(())
    }
}
