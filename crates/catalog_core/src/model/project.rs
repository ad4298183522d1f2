//! Project model.

use crate::model::{ModelValidationError, Resource};
use crate::name::{format_project, parse_project, ResourceKind};
use serde::{Deserialize, Serialize};

/// Tenant namespace. Carries nothing beyond its canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// `projects/{project_id}`.
    pub name: String,
}

impl Project {
    pub fn new(project_id: &str) -> Self {
        Self {
            name: format_project(project_id),
        }
    }

    /// Returns the project id segment of the name.
    pub fn project_id(&self) -> Result<String, ModelValidationError> {
        Ok(parse_project(&self.name)?)
    }
}

impl Resource for Project {
    const KIND: ResourceKind = ResourceKind::Project;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ModelValidationError> {
        parse_project(&self.name)?;
        Ok(())
    }
}
