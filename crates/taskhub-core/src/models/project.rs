//! Project domain model.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskhubError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Active,
    Archived,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Archived => "ARCHIVED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = TaskhubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "ARCHIVED" => Ok(Self::Archived),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(TaskhubError::validation(format!(
                "unknown project status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    /// Unordered; always contains `creator_id`.
    pub member_ids: Vec<Uuid>,
    pub status: ProjectStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// The creator counts as a member even if `member_ids` were edited.
    pub fn has_member(&self, member_id: Uuid) -> bool {
        self.creator_id == member_id || self.member_ids.contains(&member_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    pub member_ids: Vec<Uuid>,
    pub deadline: Option<DateTime<Utc>>,
}

impl CreateProject {
    /// Member ids to persist: the requested set plus the creator, deduplicated.
    pub fn normalized_member_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.creator_id];
        for id in &self.member_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}
