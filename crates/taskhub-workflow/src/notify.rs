//! Notification fanout.
//!
//! [`NotificationService::notify`] is the only place a notification is
//! created. It drops self-notifications, persists the record, then
//! pushes it to the recipient's live sessions and hands email to the
//! side-effect runner. The higher-level helpers decide *who* hears
//! about an event and always go through `notify`.

use std::sync::Arc;

use taskhub_core::error::TaskhubResult;
use taskhub_core::models::comment::Comment;
use taskhub_core::models::member::Actor;
use taskhub_core::models::notification::{CreateNotification, Notification, NotificationType};
use taskhub_core::models::reference::EntityRef;
use taskhub_core::models::task::{Task, TaskStatus};
use taskhub_core::repository::NotificationRepository;
use tracing::{debug, info};
use uuid::Uuid;

use crate::email::EmailDispatcher;
use crate::realtime::{RealtimeEvent, RealtimePublisher};
use crate::side_effect::SideEffects;

/// Recipients of a status change: the assignee unless they made the
/// change, then the creator unless they are the assignee or the actor.
pub fn status_change_recipients(actor_id: Uuid, task: &Task) -> Vec<Uuid> {
    let mut recipients = Vec::with_capacity(2);
    if let Some(assignee) = task.assignee_id.filter(|&id| id != actor_id) {
        recipients.push(assignee);
    }
    if task.creator_id != actor_id && Some(task.creator_id) != task.assignee_id {
        recipients.push(task.creator_id);
    }
    recipients
}

/// Recipients of a new comment, in notification order.
///
/// Assignee and creator get `CommentAdded`; mentioned members who are
/// not already covered (and are not the author) get `CommentMentioned`.
/// Nobody appears twice.
pub fn comment_recipients(
    author_id: Uuid,
    task: &Task,
    mentions: &[Uuid],
) -> Vec<(Uuid, NotificationType)> {
    let mut notified = vec![author_id];
    let mut recipients = Vec::new();

    let watchers = task.assignee_id.into_iter().chain([task.creator_id]);
    for id in watchers {
        if !notified.contains(&id) {
            notified.push(id);
            recipients.push((id, NotificationType::CommentAdded));
        }
    }
    for &id in mentions {
        if !notified.contains(&id) {
            notified.push(id);
            recipients.push((id, NotificationType::CommentMentioned));
        }
    }
    recipients
}

pub struct NotificationService<N, P, E> {
    repo: Arc<N>,
    publisher: Arc<P>,
    email: Option<Arc<E>>,
    effects: SideEffects,
}

impl<N, P, E> Clone for NotificationService<N, P, E> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            publisher: Arc::clone(&self.publisher),
            email: self.email.clone(),
            effects: self.effects.clone(),
        }
    }
}

impl<N, P, E> NotificationService<N, P, E>
where
    N: NotificationRepository + 'static,
    P: RealtimePublisher + 'static,
    E: EmailDispatcher,
{
    /// `email: None` disables outbound email without affecting anything
    /// else.
    pub fn new(
        repo: Arc<N>,
        publisher: Arc<P>,
        email: Option<Arc<E>>,
        effects: SideEffects,
    ) -> Self {
        Self {
            repo,
            publisher,
            email,
            effects,
        }
    }

    /// Persist and deliver one notification.
    ///
    /// Returns `Ok(None)` without touching storage or any channel when
    /// the recipient is the member who triggered it.
    pub async fn notify(&self, input: CreateNotification) -> TaskhubResult<Option<Notification>> {
        if input.recipient_id == input.triggered_by {
            debug!(recipient_id = %input.recipient_id, "self-notification suppressed");
            return Ok(None);
        }

        let notification = self.repo.create(input).await?;
        info!(
            notification_id = %notification.id,
            recipient_id = %notification.recipient_id,
            kind = %notification.notification_type,
            "notification created"
        );

        self.publisher.publish(
            notification.recipient_id,
            RealtimeEvent::Notification(notification.clone()),
        );

        if let Some(email) = &self.email {
            let email = Arc::clone(email);
            let recipient_id = notification.recipient_id;
            let kind = notification.notification_type;
            let message = notification.message.clone();
            let related_id = notification.related.map(|r| r.id());
            self.effects.spawn("email", async move {
                email
                    .send_notification_email(recipient_id, kind, message, related_id)
                    .await
            });
        }

        Ok(Some(notification))
    }

    /// Run [`Self::notify`] as a best-effort side effect.
    pub fn dispatch(&self, input: CreateNotification) {
        let this = self.clone();
        self.effects.spawn("notification", async move {
            this.notify(input).await.map(|_| ())
        });
    }

    /// `except` is left out of the recipients; used for an assignee who
    /// is told about the same write through [`Self::assigned`].
    pub fn status_changed(
        &self,
        actor: &Actor,
        task: &Task,
        from: TaskStatus,
        except: Option<Uuid>,
    ) {
        let message = format!(
            "Task \"{}\" moved from {} to {}",
            task.title, from, task.status
        );
        let recipients = status_change_recipients(actor.id, task)
            .into_iter()
            .filter(|&id| Some(id) != except);
        for recipient_id in recipients {
            self.dispatch(CreateNotification {
                tenant_id: task.tenant_id,
                recipient_id,
                triggered_by: actor.id,
                notification_type: NotificationType::TaskStatusChanged,
                message: message.clone(),
                related: Some(EntityRef::Task(task.id)),
            });
        }
    }

    /// Tell the current assignee, if any, that the task is theirs.
    pub fn assigned(&self, actor: &Actor, task: &Task) {
        let Some(recipient_id) = task.assignee_id else {
            return;
        };
        self.dispatch(CreateNotification {
            tenant_id: task.tenant_id,
            recipient_id,
            triggered_by: actor.id,
            notification_type: NotificationType::TaskAssigned,
            message: format!("You were assigned to task \"{}\"", task.title),
            related: Some(EntityRef::Task(task.id)),
        });
    }

    pub fn comment_added(&self, task: &Task, comment: &Comment) {
        for (recipient_id, kind) in comment_recipients(comment.author_id, task, &comment.mentions)
        {
            let message = match kind {
                NotificationType::CommentMentioned => {
                    format!("You were mentioned in a comment on \"{}\"", task.title)
                }
                _ => format!("New comment on \"{}\"", task.title),
            };
            self.dispatch(CreateNotification {
                tenant_id: task.tenant_id,
                recipient_id,
                triggered_by: comment.author_id,
                notification_type: kind,
                message,
                related: Some(EntityRef::Comment(comment.id)),
            });
        }
    }
}
