//! Comment creation with mention resolution, and comment deletion.

use std::sync::Arc;

use serde_json::json;
use taskhub_core::error::{TaskhubError, TaskhubResult};
use taskhub_core::mention::mentioned_member_ids;
use taskhub_core::models::activity::ActivityAction;
use taskhub_core::models::comment::{Comment, CreateComment};
use taskhub_core::models::member::Actor;
use taskhub_core::models::reference::EntityRef;
use taskhub_core::permission::{Operation, require};
use taskhub_core::repository::{
    ActivityLogRepository, CommentRepository, MemberRepository, NotificationRepository,
    TaskRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::activity::ActivityRecorder;
use crate::email::EmailDispatcher;
use crate::notify::NotificationService;
use crate::realtime::RealtimePublisher;

pub struct CommentService<C, T, M, A, N, P, E> {
    comments: Arc<C>,
    tasks: Arc<T>,
    members: Arc<M>,
    activity: ActivityRecorder<A>,
    notifications: NotificationService<N, P, E>,
    max_length: usize,
}

impl<C, T, M, A, N, P, E> CommentService<C, T, M, A, N, P, E>
where
    C: CommentRepository,
    T: TaskRepository,
    M: MemberRepository,
    A: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
    P: RealtimePublisher + 'static,
    E: EmailDispatcher,
{
    pub fn new(
        comments: Arc<C>,
        tasks: Arc<T>,
        members: Arc<M>,
        activity: ActivityRecorder<A>,
        notifications: NotificationService<N, P, E>,
        max_length: usize,
    ) -> Self {
        Self {
            comments,
            tasks,
            members,
            activity,
            notifications,
            max_length,
        }
    }

    /// Post a comment on a task.
    ///
    /// Mentions are resolved against the tenant's current members and
    /// stored on the comment. Assignee, creator and mentioned members
    /// are each notified at most once.
    pub async fn create_comment(
        &self,
        actor: &Actor,
        task_id: Uuid,
        text: &str,
    ) -> TaskhubResult<Comment> {
        require(actor, Operation::CreateComment)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskhubError::validation("comment must not be empty"));
        }
        let length = text.chars().count();
        if length > self.max_length {
            return Err(TaskhubError::validation(format!(
                "comment is {length} characters; the limit is {}",
                self.max_length
            )));
        }

        let task = self.tasks.get_by_id(actor.tenant_id, task_id, false).await?;
        let members = self.members.list_by_tenant(actor.tenant_id, false).await?;
        let mentions = mentioned_member_ids(text, &members);

        let comment = self
            .comments
            .create(CreateComment {
                tenant_id: actor.tenant_id,
                task_id,
                author_id: actor.id,
                text: text.to_string(),
                mentions,
            })
            .await?;
        info!(
            comment_id = %comment.id,
            task_id = %task_id,
            mentions = comment.mentions.len(),
            "comment created"
        );

        self.activity.record(
            actor,
            ActivityAction::CommentAdded,
            Some(EntityRef::Comment(comment.id)),
            format!("Commented on \"{}\"", task.title),
            Some(json!({ "task_id": task.id })),
        );
        self.notifications.comment_added(&task, &comment);
        Ok(comment)
    }

    /// Soft-delete a comment. Authors may delete their own; ADMIN and
    /// MANAGER may delete any.
    pub async fn delete_comment(&self, actor: &Actor, comment_id: Uuid) -> TaskhubResult<()> {
        let comment = self
            .comments
            .get_by_id(actor.tenant_id, comment_id, false)
            .await?;
        if comment.author_id != actor.id {
            require(actor, Operation::DeleteAnyComment)?;
        }

        self.comments.delete(actor.tenant_id, comment_id).await?;
        info!(comment_id = %comment_id, actor_id = %actor.id, "comment deleted");

        self.activity.record(
            actor,
            ActivityAction::CommentDeleted,
            Some(EntityRef::Comment(comment.id)),
            "Deleted a comment",
            Some(json!({ "task_id": comment.task_id })),
        );
        Ok(())
    }
}
