//! SurrealDB repository implementations.

mod activity;
mod comment;
mod member;
mod notification;
mod project;
mod task;
mod tenant;

pub use activity::SurrealActivityLogRepository;
pub use comment::SurrealCommentRepository;
pub use member::{SurrealMemberRepository, hash_password, verify_password};
pub use notification::SurrealNotificationRepository;
pub use project::SurrealProjectRepository;
pub use task::SurrealTaskRepository;
pub use tenant::SurrealTenantRepository;

use surrealdb_types::SurrealValue;
use taskhub_core::models::reference::EntityRef;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

fn parse_uuids(values: &[String], field: &str) -> Result<Vec<Uuid>, DbError> {
    values.iter().map(|v| parse_uuid(v, field)).collect()
}

fn parse_enum<T>(value: &str) -> Result<T, DbError>
where
    T: std::str::FromStr<Err = taskhub_core::error::TaskhubError>,
{
    value.parse().map_err(|e: taskhub_core::error::TaskhubError| DbError::Decode(e.to_string()))
}

/// `AND is_deleted = false` unless deleted rows were asked for.
fn deleted_filter(include_deleted: bool) -> &'static str {
    if include_deleted {
        ""
    } else {
        " AND is_deleted = false"
    }
}

/// Rebuild an [`EntityRef`] from its `*_type` / `*_id` column pair.
fn entity_ref(kind: Option<&str>, id: Option<&str>) -> Result<Option<EntityRef>, DbError> {
    match (kind, id) {
        (Some(kind), Some(id)) => {
            let id = parse_uuid(id, kind)?;
            EntityRef::from_parts(kind, id)
                .map(Some)
                .ok_or_else(|| DbError::Decode(format!("unknown entity kind: {kind}")))
        }
        (None, None) => Ok(None),
        _ => Err(DbError::Decode("half-populated entity reference".into())),
    }
}
