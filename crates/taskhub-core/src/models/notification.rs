//! Notification domain model.
//!
//! Notifications are append-only: after creation the only mutation is
//! flipping `read`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskhubError;
use crate::models::reference::EntityRef;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum NotificationType {
    TaskAssigned,
    TaskStatusChanged,
    CommentAdded,
    CommentMentioned,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskAssigned => "TASK_ASSIGNED",
            Self::TaskStatusChanged => "TASK_STATUS_CHANGED",
            Self::CommentAdded => "COMMENT_ADDED",
            Self::CommentMentioned => "COMMENT_MENTIONED",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = TaskhubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TASK_ASSIGNED" => Ok(Self::TaskAssigned),
            "TASK_STATUS_CHANGED" => Ok(Self::TaskStatusChanged),
            "COMMENT_ADDED" => Ok(Self::CommentAdded),
            "COMMENT_MENTIONED" => Ok(Self::CommentMentioned),
            other => Err(TaskhubError::validation(format!(
                "unknown notification type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub recipient_id: Uuid,
    /// The member whose action produced this notification.
    pub triggered_by: Uuid,
    pub notification_type: NotificationType,
    pub message: String,
    pub related: Option<EntityRef>,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub tenant_id: Uuid,
    pub recipient_id: Uuid,
    pub triggered_by: Uuid,
    pub notification_type: NotificationType,
    pub message: String,
    pub related: Option<EntityRef>,
}
