//! SurrealDB implementation of [`NotificationRepository`].
//!
//! Notifications are never deleted. The only mutation after creation is
//! flipping `is_read`, and that is always scoped to the recipient.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskhub_core::error::TaskhubResult;
use taskhub_core::models::notification::{CreateNotification, Notification};
use taskhub_core::repository::{NotificationRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use super::{CountRow, entity_ref, parse_enum, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct NotificationRow {
    tenant_id: String,
    recipient_id: String,
    triggered_by: String,
    notification_type: String,
    message: String,
    related_type: Option<String>,
    related_id: Option<String>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self, id: Uuid) -> Result<Notification, DbError> {
        Ok(Notification {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            recipient_id: parse_uuid(&self.recipient_id, "recipient")?,
            triggered_by: parse_uuid(&self.triggered_by, "triggered_by")?,
            notification_type: parse_enum(&self.notification_type)?,
            message: self.message,
            related: entity_ref(self.related_type.as_deref(), self.related_id.as_deref())?,
            read: self.is_read,
            read_at: self.read_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct NotificationRowWithId {
    record_id: String,
    tenant_id: String,
    recipient_id: String,
    triggered_by: String,
    notification_type: String,
    message: String,
    related_type: Option<String>,
    related_id: Option<String>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl NotificationRowWithId {
    fn try_into_notification(self) -> Result<Notification, DbError> {
        let id = parse_uuid(&self.record_id, "notification")?;
        NotificationRow {
            tenant_id: self.tenant_id,
            recipient_id: self.recipient_id,
            triggered_by: self.triggered_by,
            notification_type: self.notification_type,
            message: self.message,
            related_type: self.related_type,
            related_id: self.related_id,
            is_read: self.is_read,
            read_at: self.read_at,
            created_at: self.created_at,
        }
        .into_notification(id)
    }
}

/// SurrealDB implementation of the Notification repository.
#[derive(Clone)]
pub struct SurrealNotificationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNotificationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> NotificationRepository for SurrealNotificationRepository<C> {
    async fn create(&self, input: CreateNotification) -> TaskhubResult<Notification> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('notification', $id) SET \
                 tenant_id = $tenant_id, recipient_id = $recipient_id, \
                 triggered_by = $triggered_by, \
                 notification_type = $notification_type, \
                 message = $message, related_type = $related_type, \
                 related_id = $related_id, is_read = false, read_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("recipient_id", input.recipient_id.to_string()))
            .bind(("triggered_by", input.triggered_by.to_string()))
            .bind((
                "notification_type",
                input.notification_type.as_str().to_string(),
            ))
            .bind(("message", input.message))
            .bind(("related_type", input.related.map(|r| r.kind().to_string())))
            .bind(("related_id", input.related.map(|r| r.id().to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("notification", e))?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn list_for_recipient(
        &self,
        tenant_id: Uuid,
        recipient_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> TaskhubResult<PaginatedResult<Notification>> {
        let tenant_id_str = tenant_id.to_string();
        let recipient_id_str = recipient_id.to_string();
        let filter = if unread_only { " AND is_read = false" } else { "" };

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM notification \
                 WHERE tenant_id = $tenant_id \
                 AND recipient_id = $recipient_id{filter} GROUP ALL"
            ))
            .bind(("tenant_id", tenant_id_str.clone()))
            .bind(("recipient_id", recipient_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM notification \
                 WHERE tenant_id = $tenant_id \
                 AND recipient_id = $recipient_id{filter} \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("tenant_id", tenant_id_str))
            .bind(("recipient_id", recipient_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(NotificationRowWithId::try_into_notification)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn mark_read(
        &self,
        tenant_id: Uuid,
        recipient_id: Uuid,
        id: Uuid,
    ) -> TaskhubResult<Notification> {
        let id_str = id.to_string();

        // Already-read rows keep their original read_at.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('notification', $id) SET \
                 is_read = true, read_at = read_at ?? time::now() \
                 WHERE tenant_id = $tenant_id \
                 AND recipient_id = $recipient_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("recipient_id", recipient_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn mark_all_read(&self, tenant_id: Uuid, recipient_id: Uuid) -> TaskhubResult<u64> {
        let mut result = self
            .db
            .query(
                "UPDATE notification SET is_read = true, read_at = time::now() \
                 WHERE tenant_id = $tenant_id \
                 AND recipient_id = $recipient_id AND is_read = false \
                 RETURN VALUE meta::id(id)",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("recipient_id", recipient_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let flipped: Vec<String> = result.take(0).map_err(DbError::from)?;
        Ok(flipped.len() as u64)
    }

    async fn unread_count(&self, tenant_id: Uuid, recipient_id: Uuid) -> TaskhubResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM notification \
                 WHERE tenant_id = $tenant_id \
                 AND recipient_id = $recipient_id AND is_read = false \
                 GROUP ALL",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("recipient_id", recipient_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
