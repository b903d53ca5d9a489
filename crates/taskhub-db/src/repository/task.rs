//! SurrealDB implementation of [`TaskRepository`].
//!
//! Status writes are conditional: the `UPDATE` only matches while the
//! stored status still equals the caller's expected value, so two
//! racing writers cannot both succeed against the same observed state.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskhub_core::error::TaskhubResult;
use taskhub_core::models::task::{CreateTask, Task, TaskPatch, TaskStatus};
use taskhub_core::repository::TaskRepository;
use uuid::Uuid;

use super::{CountRow, deleted_filter, parse_enum, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TaskRow {
    tenant_id: String,
    project_id: String,
    title: String,
    description: String,
    assignee_id: Option<String>,
    creator_id: String,
    status: String,
    priority: String,
    due_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRow {
    fn into_task(self, id: Uuid) -> Result<Task, DbError> {
        Ok(Task {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            project_id: parse_uuid(&self.project_id, "project")?,
            title: self.title,
            description: self.description,
            assignee_id: self
                .assignee_id
                .as_deref()
                .map(|s| parse_uuid(s, "assignee"))
                .transpose()?,
            creator_id: parse_uuid(&self.creator_id, "creator")?,
            status: parse_enum(&self.status)?,
            priority: parse_enum(&self.priority)?,
            due_date: self.due_date,
            completed_at: self.completed_at,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct TaskRowWithId {
    record_id: String,
    tenant_id: String,
    project_id: String,
    title: String,
    description: String,
    assignee_id: Option<String>,
    creator_id: String,
    status: String,
    priority: String,
    due_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRowWithId {
    fn try_into_task(self) -> Result<Task, DbError> {
        let id = parse_uuid(&self.record_id, "task")?;
        TaskRow {
            tenant_id: self.tenant_id,
            project_id: self.project_id,
            title: self.title,
            description: self.description,
            assignee_id: self.assignee_id,
            creator_id: self.creator_id,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            completed_at: self.completed_at,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_task(id)
    }
}

/// SurrealDB implementation of the Task repository.
#[derive(Clone)]
pub struct SurrealTaskRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTaskRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Explain why a conditional write matched nothing: the task is
    /// either gone (`NotFound`) or its status moved (`Conflict`).
    async fn miss_reason(&self, tenant_id: Uuid, id: Uuid) -> Result<DbError, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM type::record('task', $id) \
                 WHERE tenant_id = $tenant_id AND is_deleted = false \
                 GROUP ALL",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        let exists = rows.first().is_some_and(|r| r.total > 0);

        let entity = "task".to_string();
        let id = id.to_string();
        Ok(if exists {
            DbError::Conflict { entity, id }
        } else {
            DbError::NotFound { entity, id }
        })
    }

    async fn first_or_miss(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        rows: Vec<TaskRow>,
    ) -> TaskhubResult<Task> {
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_task(id)?),
            None => {
                let reason = self.miss_reason(tenant_id, id).await?;
                Err(reason.into())
            }
        }
    }
}

impl<C: Connection> TaskRepository for SurrealTaskRepository<C> {
    async fn create(&self, input: CreateTask) -> TaskhubResult<Task> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('task', $id) SET \
                 tenant_id = $tenant_id, project_id = $project_id, \
                 title = $title, description = $description, \
                 assignee_id = $assignee_id, creator_id = $creator_id, \
                 status = $status, priority = $priority, \
                 due_date = $due_date, completed_at = NONE, \
                 is_deleted = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("project_id", input.project_id.to_string()))
            .bind(("title", input.title))
            .bind(("description", input.description))
            .bind(("assignee_id", input.assignee_id.map(|a| a.to_string())))
            .bind(("creator_id", input.creator_id.to_string()))
            .bind(("status", TaskStatus::Todo.as_str().to_string()))
            .bind(("priority", input.priority.as_str().to_string()))
            .bind(("due_date", input.due_date))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("task", e))?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Task> {
        let id_str = id.to_string();
        let query = format!(
            "SELECT * FROM type::record('task', $id) \
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

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: TaskStatus,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> TaskhubResult<Task> {
        let result = self
            .db
            .query(
                "UPDATE type::record('task', $id) SET \
                 status = $status, completed_at = $completed_at, \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id AND status = $expected \
                 AND is_deleted = false",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("expected", expected.as_str().to_string()))
            .bind(("status", status.as_str().to_string()))
            .bind(("completed_at", completed_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;

        self.first_or_miss(tenant_id, id, rows).await
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: TaskStatus,
        patch: TaskPatch,
    ) -> TaskhubResult<Task> {
        let mut sets = Vec::new();
        if patch.title.is_some() {
            sets.push("title = $title");
        }
        if patch.description.is_some() {
            sets.push("description = $description");
        }
        if patch.priority.is_some() {
            sets.push("priority = $priority");
        }
        if patch.due_date.is_some() {
            sets.push("due_date = $due_date");
        }
        if patch.assignee_id.is_some() {
            sets.push("assignee_id = $assignee_id");
        }
        if patch.status.is_some() {
            sets.push("status = $status");
        }
        if patch.completed_at.is_some() {
            sets.push("completed_at = $completed_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('task', $id) SET {} \
             WHERE tenant_id = $tenant_id AND status = $expected \
             AND is_deleted = false",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("expected", expected.as_str().to_string()));

        if let Some(title) = patch.title {
            builder = builder.bind(("title", title));
        }
        if let Some(description) = patch.description {
            builder = builder.bind(("description", description));
        }
        if let Some(priority) = patch.priority {
            builder = builder.bind(("priority", priority.as_str().to_string()));
        }
        if let Some(due_date) = patch.due_date {
            builder = builder.bind(("due_date", due_date));
        }
        if let Some(assignee_id) = patch.assignee_id {
            builder = builder.bind(("assignee_id", assignee_id.map(|a| a.to_string())));
        }
        if let Some(status) = patch.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(completed_at) = patch.completed_at {
            builder = builder.bind(("completed_at", completed_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;

        self.first_or_miss(tenant_id, id, rows).await
    }

    async fn list_by_project(
        &self,
        tenant_id: Uuid,
        project_id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Vec<Task>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM task \
             WHERE tenant_id = $tenant_id AND project_id = $project_id{} \
             ORDER BY created_at ASC",
            deleted_filter(include_deleted)
        );

        let mut result = self
            .db
            .query(query)
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("project_id", project_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRowWithId> = result.take(0).map_err(DbError::from)?;
        let tasks = rows
            .into_iter()
            .map(TaskRowWithId::try_into_task)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(tasks)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> TaskhubResult<()> {
        self.db
            .query(
                "UPDATE type::record('task', $id) SET \
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
