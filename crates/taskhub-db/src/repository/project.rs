//! SurrealDB implementation of [`ProjectRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskhub_core::error::{TaskhubError, TaskhubResult};
use taskhub_core::models::project::{CreateProject, Project, ProjectStatus};
use taskhub_core::repository::{PaginatedResult, Pagination, ProjectRepository};
use uuid::Uuid;

use super::{CountRow, deleted_filter, parse_enum, parse_uuid, parse_uuids};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ProjectRow {
    tenant_id: String,
    name: String,
    description: String,
    creator_id: String,
    member_ids: Vec<String>,
    status: String,
    deadline: Option<DateTime<Utc>>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProjectRow {
    fn into_project(self, id: Uuid) -> Result<Project, DbError> {
        Ok(Project {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            name: self.name,
            description: self.description,
            creator_id: parse_uuid(&self.creator_id, "creator")?,
            member_ids: parse_uuids(&self.member_ids, "member")?,
            status: parse_enum(&self.status)?,
            deadline: self.deadline,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ProjectRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    description: String,
    creator_id: String,
    member_ids: Vec<String>,
    status: String,
    deadline: Option<DateTime<Utc>>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProjectRowWithId {
    fn try_into_project(self) -> Result<Project, DbError> {
        let id = parse_uuid(&self.record_id, "project")?;
        ProjectRow {
            tenant_id: self.tenant_id,
            name: self.name,
            description: self.description,
            creator_id: self.creator_id,
            member_ids: self.member_ids,
            status: self.status,
            deadline: self.deadline,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_project(id)
    }
}

/// SurrealDB implementation of the Project repository.
#[derive(Clone)]
pub struct SurrealProjectRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProjectRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProjectRepository for SurrealProjectRepository<C> {
    async fn create(&self, input: CreateProject) -> TaskhubResult<Project> {
        if input.name.trim().is_empty() {
            return Err(TaskhubError::validation("project name must not be empty"));
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let member_ids: Vec<String> = input
            .normalized_member_ids()
            .iter()
            .map(Uuid::to_string)
            .collect();

        let result = self
            .db
            .query(
                "CREATE type::record('project', $id) SET \
                 tenant_id = $tenant_id, \
                 name = $name, description = $description, \
                 creator_id = $creator_id, member_ids = $member_ids, \
                 status = $status, deadline = $deadline, \
                 is_deleted = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("creator_id", input.creator_id.to_string()))
            .bind(("member_ids", member_ids))
            .bind(("status", ProjectStatus::Active.as_str().to_string()))
            .bind(("deadline", input.deadline))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("project", e))?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(row.into_project(id)?)
    }

    async fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Project> {
        let id_str = id.to_string();
        let query = format!(
            "SELECT * FROM type::record('project', $id) \
             WHERE tenant_id = $tenant_id{}",
            deleted_filter(include_deleted)
        );

        let mut result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(row.into_project(id)?)
    }

    async fn add_member(&self, tenant_id: Uuid, id: Uuid, member_id: Uuid) -> TaskhubResult<Project> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('project', $id) SET \
                 member_ids = array::union(member_ids, [$member_id]), \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id AND is_deleted = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("member_id", member_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(row.into_project(id)?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        include_deleted: bool,
        pagination: Pagination,
    ) -> TaskhubResult<PaginatedResult<Project>> {
        let tenant_id_str = tenant_id.to_string();
        let filter = deleted_filter(include_deleted);

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM project \
                 WHERE tenant_id = $tenant_id{filter} GROUP ALL"
            ))
            .bind(("tenant_id", tenant_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM project \
                 WHERE tenant_id = $tenant_id{filter} \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(ProjectRowWithId::try_into_project)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> TaskhubResult<()> {
        self.db
            .query(
                "UPDATE type::record('project', $id) SET \
                 is_deleted = true, deleted_at = time::now(), \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id AND is_deleted = false",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
