//! taskdeck wire contracts.
//!
//! Request and response bodies exchanged between the API service and its
//! clients. This crate intentionally carries only serialization types; richer
//! client-side state lives in `taskdeck-client-core`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields a task update may carry. Anything else is rejected by the service
/// with a validation error and no mutation.
pub const TASK_UPDATE_ALLOWED_FIELDS: &[&str] = &["title", "description", "completed"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub owner: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Returned by both `/auth/login` and `/auth/signup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

/// Partial update. `None` fields are omitted from the payload so the service
/// only ever sees the fields the caller actually set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskUpdateRequest {
    #[must_use]
    pub fn completed_only(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Error contract: every non-success service response carries a
/// human-readable `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_serializes_only_defined_fields() {
        let request = TaskUpdateRequest::completed_only(true);
        let value = serde_json::to_value(&request).expect("serialize update");
        assert_eq!(value, serde_json::json!({"completed": true}));

        let request = TaskUpdateRequest {
            title: Some("groceries".to_string()),
            description: None,
            completed: None,
        };
        let value = serde_json::to_value(&request).expect("serialize update");
        assert_eq!(value, serde_json::json!({"title": "groceries"}));
    }

    #[test]
    fn empty_update_request_serializes_to_empty_object() {
        let request = TaskUpdateRequest::default();
        assert!(request.is_empty());
        let value = serde_json::to_value(&request).expect("serialize update");
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn task_defaults_apply_on_deserialize() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "6f2c1f4e-52a3-4be5-a5f2-3f2e7c9f0a11",
            "title": "water the plants",
            "owner": "0a8e7d7c-1111-4f3e-9f7e-aaaaaaaaaaaa",
        }))
        .expect("deserialize task");
        assert_eq!(task.description, "");
        assert!(!task.completed);
    }

    #[test]
    fn error_body_round_trips_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":"Task not found"}"#).expect("deserialize error");
        assert_eq!(body.message, "Task not found");
    }
}
