//! Occurrence model.
//!
//! # Responsibility
//! - Attach one note's finding to a concrete artifact.
//!
//! # Invariants
//! - `name` parses as an occurrence name.
//! - `note_name` parses as a note name. Whether that note exists is a
//!   storage concern checked at create time only.

use crate::model::{
    require_non_blank, validate_cvss, ModelValidationError, NoteKind, Resource, Severity,
};
use crate::name::{format_occurrence, parse_note, parse_occurrence, ResourceKind};
use serde::{Deserialize, Serialize};

/// Concrete finding instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// `projects/{project_id}/occurrences/{occurrence_id}`.
    pub name: String,
    /// Artifact the finding is attached to, e.g. an image digest URL.
    pub resource_url: String,
    /// Canonical name of the referenced note.
    pub note_name: String,
    pub kind: NoteKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerability_details: Option<VulnerabilityDetails>,
    #[serde(default)]
    pub remediation: String,
}

/// Vulnerability payload of an occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityDetails {
    pub cvss_score: f32,
    pub severity: Severity,
    #[serde(default)]
    pub package_issues: Vec<PackageIssue>,
}

/// One affected package found on the artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIssue {
    pub affected_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_location: Option<String>,
    pub severity_name: String,
}

impl Occurrence {
    /// Creates an occurrence referencing `note_name`.
    pub fn new(project_id: &str, occurrence_id: &str, note_name: impl Into<String>) -> Self {
        Self {
            name: format_occurrence(project_id, occurrence_id),
            note_name: note_name.into(),
            ..Self::default()
        }
    }

    /// Returns `(project_id, occurrence_id)`.
    pub fn ids(&self) -> Result<(String, String), ModelValidationError> {
        Ok(parse_occurrence(&self.name)?)
    }
}

impl Resource for Occurrence {
    const KIND: ResourceKind = ResourceKind::Occurrence;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ModelValidationError> {
        parse_occurrence(&self.name)?;
        parse_note(&self.note_name)?;
        require_non_blank("resource_url", &self.resource_url)?;
        if let Some(details) = self.vulnerability_details.as_ref() {
            validate_cvss("vulnerability_details.cvss_score", details.cvss_score)?;
        }
        Ok(())
    }
}
