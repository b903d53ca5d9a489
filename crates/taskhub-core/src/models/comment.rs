//! Comment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    /// Resolved from `text` when the comment was created.
    pub mentions: Vec<Uuid>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub tenant_id: Uuid,
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub mentions: Vec<Uuid>,
}
