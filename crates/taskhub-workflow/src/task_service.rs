//! Task operations: status machine, assignment, full update, create
//! and delete.
//!
//! Every write is conditional on the status read just before it. When
//! another writer gets there first the repository reports `Conflict`;
//! the operation then re-reads once and re-checks permissions and the
//! transition table against the fresh state. A second conflict is
//! returned to the caller. Activity and notifications are only emitted
//! after the write has committed.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use taskhub_core::error::{TaskhubError, TaskhubResult};
use taskhub_core::models::activity::ActivityAction;
use taskhub_core::models::member::Actor;
use taskhub_core::models::reference::EntityRef;
use taskhub_core::models::task::{CreateTask, Task, TaskPatch, TaskStatus, UpdateTask};
use taskhub_core::permission::{Operation, authorize_status_change, require};
use taskhub_core::repository::{
    ActivityLogRepository, MemberRepository, NotificationRepository, ProjectRepository,
    TaskRepository,
};
use taskhub_core::workflow::{check_transition, completion_after};
use tracing::{debug, info};
use uuid::Uuid;

use crate::activity::ActivityRecorder;
use crate::email::EmailDispatcher;
use crate::notify::NotificationService;
use crate::realtime::RealtimePublisher;

pub struct TaskService<T, M, Pr, A, N, P, E> {
    tasks: Arc<T>,
    members: Arc<M>,
    projects: Arc<Pr>,
    activity: ActivityRecorder<A>,
    notifications: NotificationService<N, P, E>,
}

impl<T, M, Pr, A, N, P, E> TaskService<T, M, Pr, A, N, P, E>
where
    T: TaskRepository,
    M: MemberRepository,
    Pr: ProjectRepository,
    A: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
    P: RealtimePublisher + 'static,
    E: EmailDispatcher,
{
    pub fn new(
        tasks: Arc<T>,
        members: Arc<M>,
        projects: Arc<Pr>,
        activity: ActivityRecorder<A>,
        notifications: NotificationService<N, P, E>,
    ) -> Self {
        Self {
            tasks,
            members,
            projects,
            activity,
            notifications,
        }
    }

    pub async fn get_task(&self, actor: &Actor, task_id: Uuid) -> TaskhubResult<Task> {
        self.tasks.get_by_id(actor.tenant_id, task_id, false).await
    }

    /// Move a task to `requested`.
    pub async fn change_status(
        &self,
        actor: &Actor,
        task_id: Uuid,
        requested: TaskStatus,
    ) -> TaskhubResult<Task> {
        let mut retried = false;
        loop {
            let task = self.get_task(actor, task_id).await?;
            authorize_status_change(actor, &task)?;
            check_transition(task.status, requested)?;

            let completed_at = completion_after(requested, task.completed_at, Utc::now());
            let written = self
                .tasks
                .update_status(actor.tenant_id, task_id, task.status, requested, completed_at)
                .await;

            match written {
                Ok(updated) => {
                    self.after_status_change(actor, &updated, task.status, None);
                    return Ok(updated);
                }
                Err(TaskhubError::Conflict { .. }) if !retried => {
                    debug!(task_id = %task_id, "task changed concurrently; retrying once");
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Set or clear the assignee. Re-assigning the current assignee is
    /// a successful no-op with no log entry and no notification.
    pub async fn assign(
        &self,
        actor: &Actor,
        task_id: Uuid,
        assignee_id: Option<Uuid>,
    ) -> TaskhubResult<Task> {
        require(actor, Operation::AssignTask)?;
        if let Some(id) = assignee_id {
            self.ensure_member(actor, id).await?;
        }

        let mut retried = false;
        loop {
            let task = self.get_task(actor, task_id).await?;
            if task.assignee_id == assignee_id {
                debug!(task_id = %task_id, "assignee unchanged");
                return Ok(task);
            }

            let patch = TaskPatch {
                assignee_id: Some(assignee_id),
                ..TaskPatch::default()
            };
            match self
                .tasks
                .update(actor.tenant_id, task_id, task.status, patch)
                .await
            {
                Ok(updated) => {
                    self.after_assignment(actor, &updated, task.assignee_id);
                    return Ok(updated);
                }
                Err(TaskhubError::Conflict { .. }) if !retried => {
                    debug!(task_id = %task_id, "task changed concurrently; retrying once");
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Full update (`PUT /tasks/:id`).
    ///
    /// A MEMBER may only send `status` and is routed through
    /// [`Self::change_status`]. ADMIN and MANAGER changes are validated
    /// up front and written together.
    pub async fn update_task(
        &self,
        actor: &Actor,
        task_id: Uuid,
        changes: UpdateTask,
    ) -> TaskhubResult<Task> {
        if !actor.role.is_privileged() {
            let extra = changes.non_status_fields();
            if !extra.is_empty() {
                return Err(TaskhubError::InvalidOperation {
                    reason: format!(
                        "{} may only change a task's status, not: {}",
                        actor.role,
                        extra.join(", ")
                    ),
                });
            }
            let Some(status) = changes.status else {
                return Err(TaskhubError::InvalidOperation {
                    reason: format!("{} may only change a task's status", actor.role),
                });
            };
            return self.change_status(actor, task_id, status).await;
        }

        require(actor, Operation::UpdateTaskFields)?;
        let title = match &changes.title {
            Some(t) if t.trim().is_empty() => {
                return Err(TaskhubError::validation("task title must not be empty"));
            }
            Some(t) => Some(t.trim().to_string()),
            None => None,
        };
        if let Some(Some(id)) = changes.assignee_id {
            self.ensure_member(actor, id).await?;
        }

        let mut retried = false;
        loop {
            let task = self.get_task(actor, task_id).await?;
            let status = changes.status.filter(|&s| s != task.status);
            if let Some(next) = status {
                check_transition(task.status, next)?;
            }

            let patch = TaskPatch {
                title: title.clone(),
                description: changes.description.clone(),
                priority: changes.priority,
                due_date: changes.due_date,
                assignee_id: changes.assignee_id,
                status,
                completed_at: status
                    .map(|next| completion_after(next, task.completed_at, Utc::now())),
            };
            match self
                .tasks
                .update(actor.tenant_id, task_id, task.status, patch)
                .await
            {
                Ok(updated) => {
                    self.after_update(actor, &task, &updated, &changes);
                    return Ok(updated);
                }
                Err(TaskhubError::Conflict { .. }) if !retried => {
                    debug!(task_id = %task_id, "task changed concurrently; retrying once");
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Create a task in one of the actor's projects.
    ///
    /// Tenant and creator are always taken from `actor`.
    pub async fn create_task(&self, actor: &Actor, input: CreateTask) -> TaskhubResult<Task> {
        require(actor, Operation::CreateTask)?;
        let title = input.title.trim();
        if title.is_empty() {
            return Err(TaskhubError::validation("task title must not be empty"));
        }
        self.projects
            .get_by_id(actor.tenant_id, input.project_id, false)
            .await?;
        if let Some(id) = input.assignee_id {
            self.ensure_member(actor, id).await?;
        }

        let task = self
            .tasks
            .create(CreateTask {
                tenant_id: actor.tenant_id,
                creator_id: actor.id,
                title: title.to_string(),
                ..input
            })
            .await?;
        info!(task_id = %task.id, project_id = %task.project_id, actor_id = %actor.id, "task created");

        self.activity.record(
            actor,
            ActivityAction::TaskCreated,
            Some(EntityRef::Task(task.id)),
            format!("Created task \"{}\"", task.title),
            None,
        );
        self.notifications.assigned(actor, &task);
        Ok(task)
    }

    /// Soft-delete a task.
    pub async fn delete_task(&self, actor: &Actor, task_id: Uuid) -> TaskhubResult<()> {
        require(actor, Operation::DeleteTask)?;
        let task = self.get_task(actor, task_id).await?;
        self.tasks.delete(actor.tenant_id, task_id).await?;
        info!(task_id = %task_id, actor_id = %actor.id, "task deleted");

        self.activity.record(
            actor,
            ActivityAction::TaskDeleted,
            Some(EntityRef::Task(task.id)),
            format!("Deleted task \"{}\"", task.title),
            None,
        );
        Ok(())
    }

    async fn ensure_member(&self, actor: &Actor, member_id: Uuid) -> TaskhubResult<()> {
        self.members
            .get_by_id(actor.tenant_id, member_id, false)
            .await
            .map(|_| ())
    }

    fn after_status_change(
        &self,
        actor: &Actor,
        task: &Task,
        from: TaskStatus,
        newly_assigned: Option<Uuid>,
    ) {
        info!(
            task_id = %task.id,
            from = %from,
            to = %task.status,
            actor_id = %actor.id,
            "task status changed"
        );
        self.activity.record(
            actor,
            ActivityAction::TaskStatusChanged,
            Some(EntityRef::Task(task.id)),
            format!(
                "Moved \"{}\" from {} to {}",
                task.title, from, task.status
            ),
            Some(json!({ "from": from, "to": task.status })),
        );
        self.notifications.status_changed(actor, task, from, newly_assigned);
    }

    fn after_assignment(&self, actor: &Actor, task: &Task, previous: Option<Uuid>) {
        info!(
            task_id = %task.id,
            assignee_id = ?task.assignee_id,
            actor_id = %actor.id,
            "task assignee changed"
        );
        self.activity.record(
            actor,
            ActivityAction::TaskAssigned,
            Some(EntityRef::Task(task.id)),
            match task.assignee_id {
                Some(_) => format!("Assigned \"{}\"", task.title),
                None => format!("Unassigned \"{}\"", task.title),
            },
            Some(json!({ "from": previous, "to": task.assignee_id })),
        );
        if task.assignee_id != previous {
            self.notifications.assigned(actor, task);
        }
    }

    fn after_update(&self, actor: &Actor, before: &Task, after: &Task, changes: &UpdateTask) {
        let edited: Vec<&str> = changes
            .non_status_fields()
            .into_iter()
            .filter(|&f| f != "assignee_id")
            .collect();
        if !edited.is_empty() {
            info!(task_id = %after.id, fields = ?edited, actor_id = %actor.id, "task updated");
            self.activity.record(
                actor,
                ActivityAction::TaskUpdated,
                Some(EntityRef::Task(after.id)),
                format!("Updated \"{}\"", after.title),
                Some(json!({ "fields": edited })),
            );
        }
        if after.status != before.status {
            // A new assignee hears about the write once, as an assignment.
            let newly_assigned = after
                .assignee_id
                .filter(|_| after.assignee_id != before.assignee_id);
            self.after_status_change(actor, after, before.status, newly_assigned);
        }
        if changes.assignee_id.is_some() {
            self.after_assignment(actor, after, before.assignee_id);
        }
    }
}
