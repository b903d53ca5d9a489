//! Member (user) domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TaskhubError, TaskhubResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Admin,
    Manager,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Member => "MEMBER",
        }
    }

    /// ADMIN or MANAGER.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Resolve the role a new signup actually receives.
    ///
    /// The first member of a tenant is always ADMIN, whatever was
    /// requested. Later members pick MANAGER or MEMBER; asking for
    /// ADMIN is rejected.
    pub fn for_signup(existing_members: u64, requested: MemberRole) -> TaskhubResult<MemberRole> {
        if existing_members == 0 {
            return Ok(MemberRole::Admin);
        }
        match requested {
            MemberRole::Admin => Err(TaskhubError::validation(
                "only the first member of a company can be ADMIN",
            )),
            other => Ok(other),
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = TaskhubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            "MEMBER" => Ok(Self::Member),
            other => Err(TaskhubError::validation(format!("unknown role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Full display name; mentions match against it.
    pub name: String,
    /// Unique across the whole system, not just the tenant.
    pub email: String,
    pub password_hash: String,
    pub role: MemberRole,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMember {
    pub tenant_id: Uuid,
    pub name: String,
    pub email: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    /// Requested role; see [`MemberRole::for_signup`].
    pub role: MemberRole,
}

/// The caller of a workflow operation.
///
/// Built from an authenticated [`Member`]; carries only what the
/// permission checks need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub role: MemberRole,
}

impl From<&Member> for Actor {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            tenant_id: member.tenant_id,
            role: member.role,
        }
    }
}
