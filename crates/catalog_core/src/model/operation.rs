//! Long-running operation record.

use crate::model::{ModelValidationError, Resource};
use crate::name::{format_operation, parse_operation, ResourceKind};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Task record with a completion flag and result payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// `projects/{project_id}/operations/{operation_id}`.
    pub name: String,
    pub done: bool,
    /// Absent stays `None`; an explicit JSON `null` is kept as `Some(Null)`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub metadata: Option<serde_json::Value>,
    /// Meaningful once `done` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<OperationResult>,
}

/// Terminal outcome of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    Error(OperationStatus),
    Response(serde_json::Value),
}

/// Error status recorded for a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub code: i32,
    pub message: String,
}

impl Operation {
    pub fn new(project_id: &str, operation_id: &str) -> Self {
        Self {
            name: format_operation(project_id, operation_id),
            ..Self::default()
        }
    }

    /// Creates a pending operation with a random UUIDv4 operation id.
    pub fn with_generated_id(project_id: &str) -> Self {
        Self::new(project_id, &Uuid::new_v4().to_string())
    }

    /// Returns `(project_id, operation_id)`.
    pub fn ids(&self) -> Result<(String, String), ModelValidationError> {
        Ok(parse_operation(&self.name)?)
    }

    /// Marks the operation done with a successful response.
    pub fn complete(&mut self, response: serde_json::Value) {
        self.done = true;
        self.result = Some(OperationResult::Response(response));
    }

    /// Marks the operation done with an error status.
    pub fn fail(&mut self, code: i32, message: impl Into<String>) {
        self.done = true;
        self.result = Some(OperationResult::Error(OperationStatus {
            code,
            message: message.into(),
        }));
    }
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl Resource for Operation {
    const KIND: ResourceKind = ResourceKind::Operation;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ModelValidationError> {
        parse_operation(&self.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_parse() {
        let first = Operation::with_generated_id("builds");
        let second = Operation::with_generated_id("builds");
        assert_ne!(first.name, second.name);
        let (project_id, operation_id) = first.ids().unwrap();
        assert_eq!(project_id, "builds");
        assert!(Uuid::parse_str(&operation_id).is_ok());
    }

    #[test]
    fn explicit_null_metadata_survives_json() {
        let operation = Operation {
            metadata: Some(serde_json::Value::Null),
            ..Operation::new("p", "x")
        };
        let body = serde_json::to_string(&operation).unwrap();
        assert!(body.contains("\"metadata\":null"));
        let decoded: Operation = serde_json::from_str(&body).unwrap();
        assert_eq!(decoded, operation);

        let absent: Operation =
            serde_json::from_str(r#"{"name":"projects/p/operations/x","done":false}"#).unwrap();
        assert_eq!(absent.metadata, None);
    }

    #[test]
    fn fail_sets_done_and_status() {
        let mut operation = Operation::new("p", "op");
        operation.fail(13, "scanner crashed");
        assert!(operation.done);
        assert_eq!(
            operation.result,
            Some(OperationResult::Error(OperationStatus {
                code: 13,
                message: "scanner crashed".to_string(),
            }))
        );
    }
}
