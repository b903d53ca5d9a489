//! Outbound email seam.
//!
//! No transport ships with the workflow crate. A deployment plugs one
//! in by implementing [`EmailDispatcher`]; without one, notification
//! email is skipped entirely.

use taskhub_core::error::TaskhubResult;
use taskhub_core::models::notification::NotificationType;
use uuid::Uuid;

pub trait EmailDispatcher: Send + Sync + 'static {
    fn send_notification_email(
        &self,
        recipient_id: Uuid,
        notification_type: NotificationType,
        message: String,
        related_id: Option<Uuid>,
    ) -> impl Future<Output = TaskhubResult<()>> + Send;
}

/// Placeholder type for deployments without an email transport.
///
/// Uninhabited, so `Option<NoEmail>` is always `None`.
pub enum NoEmail {}

impl EmailDispatcher for NoEmail {
    async fn send_notification_email(
        &self,
        _recipient_id: Uuid,
        _notification_type: NotificationType,
        _message: String,
        _related_id: Option<Uuid>,
    ) -> TaskhubResult<()> {
        match *self {}
    }
}
