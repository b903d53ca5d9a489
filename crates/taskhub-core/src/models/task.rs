//! Task domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::TaskhubError;

/// Task lifecycle state. Legal moves live in [`crate::workflow`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    InReview,
    Done,
    Blocker,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::Done,
        TaskStatus::Blocker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::InReview => "IN_REVIEW",
            Self::Done => "DONE",
            Self::Blocker => "BLOCKER",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskhubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "IN_REVIEW" => Ok(Self::InReview),
            "DONE" => Ok(Self::Done),
            "BLOCKER" => Ok(Self::Blocker),
            other => Err(TaskhubError::validation(format!(
                "unknown task status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = TaskhubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "URGENT" => Ok(Self::Urgent),
            other => Err(TaskhubError::validation(format!(
                "unknown task priority: {other}"
            ))),
        }
    }
}

/// A unit of work inside a project.
///
/// `completed_at` is `Some` exactly when `status` is `Done`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new task. New tasks always start in `Todo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub tenant_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
}

/// A full-update request (`PUT /tasks/:id`).
///
/// For the clearable fields an absent key means no change and an
/// explicit `null` clears the value.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    /// `Some(Some(d))` = set, `Some(None)` = clear, `None` = no change.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// `Some(Some(id))` = assign, `Some(None)` = unassign, `None` = no change.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee_id: Option<Option<Uuid>>,
    pub status: Option<TaskStatus>,
}

/// Only called for keys that are present, so `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateTask {
    /// Names of the non-status fields carried by this request.
    pub fn non_status_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.priority.is_some() {
            fields.push("priority");
        }
        if self.due_date.is_some() {
            fields.push("due_date");
        }
        if self.assignee_id.is_some() {
            fields.push("assignee_id");
        }
        fields
    }
}

/// A validated, storage-level change set applied in one conditional write.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub assignee_id: Option<Option<Uuid>>,
    pub status: Option<TaskStatus>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }

    #[test]
    fn status_only_update_has_no_other_fields() {
        let update = UpdateTask {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert!(update.non_status_fields().is_empty());

        let update = UpdateTask {
            status: Some(TaskStatus::Done),
            title: Some("x".into()),
            assignee_id: Some(None),
            ..Default::default()
        };
        assert_eq!(update.non_status_fields(), vec!["title", "assignee_id"]);
    }

    #[test]
    fn explicit_null_clears_and_missing_key_keeps() {
        let update: UpdateTask =
            serde_json::from_str(r#"{"due_date": null, "assignee_id": null}"#).unwrap();
        assert_eq!(update.due_date, Some(None));
        assert_eq!(update.assignee_id, Some(None));
        assert_eq!(update.non_status_fields(), vec!["due_date", "assignee_id"]);

        let update: UpdateTask = serde_json::from_str(r#"{"status": "DONE"}"#).unwrap();
        assert_eq!(update.due_date, None);
        assert_eq!(update.assignee_id, None);
        assert!(update.non_status_fields().is_empty());

        let id = Uuid::new_v4();
        let update: UpdateTask =
            serde_json::from_str(&format!(r#"{{"assignee_id": "{id}"}}"#)).unwrap();
        assert_eq!(update.assignee_id, Some(Some(id)));
    }
}
