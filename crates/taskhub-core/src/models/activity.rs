//! Activity log domain model.
//!
//! Entries are write-once: there is no update or delete path.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskhubError;
use crate::models::reference::EntityRef;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskStatusChanged,
    TaskAssigned,
    CommentAdded,
    CommentDeleted,
    MemberJoined,
    MemberRoleChanged,
    MemberRemoved,
}

impl ActivityAction {
    pub const ALL: [ActivityAction; 13] = [
        ActivityAction::ProjectCreated,
        ActivityAction::ProjectUpdated,
        ActivityAction::ProjectDeleted,
        ActivityAction::TaskCreated,
        ActivityAction::TaskUpdated,
        ActivityAction::TaskDeleted,
        ActivityAction::TaskStatusChanged,
        ActivityAction::TaskAssigned,
        ActivityAction::CommentAdded,
        ActivityAction::CommentDeleted,
        ActivityAction::MemberJoined,
        ActivityAction::MemberRoleChanged,
        ActivityAction::MemberRemoved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectCreated => "PROJECT_CREATED",
            Self::ProjectUpdated => "PROJECT_UPDATED",
            Self::ProjectDeleted => "PROJECT_DELETED",
            Self::TaskCreated => "TASK_CREATED",
            Self::TaskUpdated => "TASK_UPDATED",
            Self::TaskDeleted => "TASK_DELETED",
            Self::TaskStatusChanged => "TASK_STATUS_CHANGED",
            Self::TaskAssigned => "TASK_ASSIGNED",
            Self::CommentAdded => "COMMENT_ADDED",
            Self::CommentDeleted => "COMMENT_DELETED",
            Self::MemberJoined => "MEMBER_JOINED",
            Self::MemberRoleChanged => "MEMBER_ROLE_CHANGED",
            Self::MemberRemoved => "MEMBER_REMOVED",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = TaskhubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| TaskhubError::validation(format!("unknown activity action: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub action: ActivityAction,
    pub description: String,
    pub performed_by: Uuid,
    pub target: Option<EntityRef>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivityLogEntry {
    pub tenant_id: Uuid,
    pub action: ActivityAction,
    pub description: String,
    pub performed_by: Uuid,
    pub target: Option<EntityRef>,
    pub metadata: Option<serde_json::Value>,
}
