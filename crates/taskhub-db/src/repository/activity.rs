//! SurrealDB implementation of [`ActivityLogRepository`].
//!
//! Append-only: there is no update or delete path, and the table's
//! permissions deny both.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskhub_core::error::TaskhubResult;
use taskhub_core::models::activity::{ActivityLogEntry, CreateActivityLogEntry};
use taskhub_core::repository::{
    ActivityLogFilter, ActivityLogRepository, PaginatedResult, Pagination,
};
use uuid::Uuid;

use super::{CountRow, entity_ref, parse_enum, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ActivityRow {
    tenant_id: String,
    action: String,
    description: String,
    performed_by: String,
    target_type: Option<String>,
    target_id: Option<String>,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl ActivityRow {
    fn into_entry(self, id: Uuid) -> Result<ActivityLogEntry, DbError> {
        Ok(ActivityLogEntry {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            action: parse_enum(&self.action)?,
            description: self.description,
            performed_by: parse_uuid(&self.performed_by, "performed_by")?,
            target: entity_ref(self.target_type.as_deref(), self.target_id.as_deref())?,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ActivityRowWithId {
    record_id: String,
    tenant_id: String,
    action: String,
    description: String,
    performed_by: String,
    target_type: Option<String>,
    target_id: Option<String>,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl ActivityRowWithId {
    fn try_into_entry(self) -> Result<ActivityLogEntry, DbError> {
        let id = parse_uuid(&self.record_id, "activity_log")?;
        ActivityRow {
            tenant_id: self.tenant_id,
            action: self.action,
            description: self.description,
            performed_by: self.performed_by,
            target_type: self.target_type,
            target_id: self.target_id,
            metadata: self.metadata,
            created_at: self.created_at,
        }
        .into_entry(id)
    }
}

/// `WHERE` conditions for a filter; every entry is ANDed.
fn filter_conditions(filter: &ActivityLogFilter) -> Vec<&'static str> {
    let mut conditions = vec!["tenant_id = $tenant_id"];
    if filter.performed_by.is_some() {
        conditions.push("performed_by = $performed_by");
    }
    if filter.action.is_some() {
        conditions.push("action = $action");
    }
    if filter.target.is_some() {
        conditions.push("target_type = $target_type");
        conditions.push("target_id = $target_id");
    }
    if filter.from.is_some() {
        conditions.push("created_at >= $from");
    }
    if filter.to.is_some() {
        conditions.push("created_at <= $to");
    }
    conditions
}

/// SurrealDB implementation of the activity log repository.
#[derive(Clone)]
pub struct SurrealActivityLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealActivityLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ActivityLogRepository for SurrealActivityLogRepository<C> {
    async fn append(&self, input: CreateActivityLogEntry) -> TaskhubResult<ActivityLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('activity_log', $id) SET \
                 tenant_id = $tenant_id, action = $action, \
                 description = $description, \
                 performed_by = $performed_by, \
                 target_type = $target_type, target_id = $target_id, \
                 metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("action", input.action.as_str().to_string()))
            .bind(("description", input.description))
            .bind(("performed_by", input.performed_by.to_string()))
            .bind(("target_type", input.target.map(|t| t.kind().to_string())))
            .bind(("target_id", input.target.map(|t| t.id().to_string())))
            .bind(("metadata", input.metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("activity_log", e))?;

        let rows: Vec<ActivityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "activity_log".into(),
            id: id_str,
        })?;

        Ok(row.into_entry(id)?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filter: ActivityLogFilter,
        pagination: Pagination,
    ) -> TaskhubResult<PaginatedResult<ActivityLogEntry>> {
        let where_clause = filter_conditions(&filter).join(" AND ");
        let query = format!(
            "SELECT count() AS total FROM activity_log \
             WHERE {where_clause} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM activity_log \
             WHERE {where_clause} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset;"
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        if let Some(performed_by) = filter.performed_by {
            builder = builder.bind(("performed_by", performed_by.to_string()));
        }
        if let Some(action) = filter.action {
            builder = builder.bind(("action", action.as_str().to_string()));
        }
        if let Some(target) = filter.target {
            builder = builder
                .bind(("target_type", target.kind().to_string()))
                .bind(("target_id", target.id().to_string()));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let rows: Vec<ActivityRowWithId> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(ActivityRowWithId::try_into_entry)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use taskhub_core::models::activity::ActivityAction;
    use taskhub_core::models::reference::EntityRef;

    use super::*;

    #[test]
    fn empty_filter_scopes_to_tenant_only() {
        let conditions = filter_conditions(&ActivityLogFilter::default());
        assert_eq!(conditions, vec!["tenant_id = $tenant_id"]);
    }

    #[test]
    fn target_filter_matches_both_columns() {
        let filter = ActivityLogFilter {
            action: Some(ActivityAction::TaskStatusChanged),
            target: Some(EntityRef::Task(Uuid::new_v4())),
            ..Default::default()
        };
        let conditions = filter_conditions(&filter);
        assert!(conditions.contains(&"action = $action"));
        assert!(conditions.contains(&"target_type = $target_type"));
        assert!(conditions.contains(&"target_id = $target_id"));
        assert_eq!(conditions.len(), 4);
    }
}
