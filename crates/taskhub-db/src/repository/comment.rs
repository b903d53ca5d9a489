//! SurrealDB implementation of [`CommentRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskhub_core::error::TaskhubResult;
use taskhub_core::models::comment::{Comment, CreateComment};
use taskhub_core::repository::CommentRepository;
use uuid::Uuid;

use super::{deleted_filter, parse_uuid, parse_uuids};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CommentRow {
    tenant_id: String,
    task_id: String,
    author_id: String,
    text: String,
    mentions: Vec<String>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self, id: Uuid) -> Result<Comment, DbError> {
        Ok(Comment {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            task_id: parse_uuid(&self.task_id, "task")?,
            author_id: parse_uuid(&self.author_id, "author")?,
            text: self.text,
            mentions: parse_uuids(&self.mentions, "mention")?,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CommentRowWithId {
    record_id: String,
    tenant_id: String,
    task_id: String,
    author_id: String,
    text: String,
    mentions: Vec<String>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl CommentRowWithId {
    fn try_into_comment(self) -> Result<Comment, DbError> {
        let id = parse_uuid(&self.record_id, "comment")?;
        CommentRow {
            tenant_id: self.tenant_id,
            task_id: self.task_id,
            author_id: self.author_id,
            text: self.text,
            mentions: self.mentions,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
        }
        .into_comment(id)
    }
}

/// SurrealDB implementation of the Comment repository.
#[derive(Clone)]
pub struct SurrealCommentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCommentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CommentRepository for SurrealCommentRepository<C> {
    async fn create(&self, input: CreateComment) -> TaskhubResult<Comment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let mentions: Vec<String> = input.mentions.iter().map(Uuid::to_string).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('comment', $id) SET \
                 tenant_id = $tenant_id, task_id = $task_id, \
                 author_id = $author_id, text = $text, \
                 mentions = $mentions, is_deleted = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("task_id", input.task_id.to_string()))
            .bind(("author_id", input.author_id.to_string()))
            .bind(("text", input.text))
            .bind(("mentions", mentions))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("comment", e))?;

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.into_comment(id)?)
    }

    async fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Comment> {
        let id_str = id.to_string();
        let query = format!(
            "SELECT * FROM type::record('comment', $id) \
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

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.into_comment(id)?)
    }

    async fn list_by_task(
        &self,
        tenant_id: Uuid,
        task_id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Vec<Comment>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM comment \
             WHERE tenant_id = $tenant_id AND task_id = $task_id{} \
             ORDER BY created_at ASC",
            deleted_filter(include_deleted)
        );

        let mut result = self
            .db
            .query(query)
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("task_id", task_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentRowWithId> = result.take(0).map_err(DbError::from)?;
        let comments = rows
            .into_iter()
            .map(CommentRowWithId::try_into_comment)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(comments)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> TaskhubResult<()> {
        self.db
            .query(
                "UPDATE type::record('comment', $id) SET \
                 is_deleted = true, deleted_at = time::now() \
                 WHERE tenant_id = $tenant_id AND is_deleted = false",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
