//! Status machine, assignment and task update flows against an
//! in-memory database.

mod common;

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use common::Harness;
use serde_json::json;
use taskhub_core::error::{TaskhubError, TaskhubResult};
use taskhub_core::models::activity::ActivityAction;
use taskhub_core::models::notification::{CreateNotification, NotificationType};
use taskhub_core::models::reference::EntityRef;
use taskhub_core::models::task::{CreateTask, Task, TaskPatch, TaskPriority, TaskStatus, UpdateTask};
use taskhub_core::repository::{ActivityLogFilter, TaskRepository};
use uuid::Uuid;

/// Walk a task through the transition table directly in storage.
async fn force_status(h: &Harness, task: &Task, path: &[TaskStatus]) -> Task {
    let repo = h.task_repo();
    let mut current = task.clone();
    for &next in path {
        current = repo
            .update_status(h.tenant_id, task.id, current.status, next, None)
            .await
            .unwrap();
    }
    current
}

fn task_log(task: &Task, action: ActivityAction) -> ActivityLogFilter {
    ActivityLogFilter {
        action: Some(action),
        target: Some(EntityRef::Task(task.id)),
        ..ActivityLogFilter::default()
    }
}

// ---------------------------------------------------------------------------
// Status changes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assignee_starts_work_on_todo_task() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let updated = h
        .tasks
        .change_status(&h.carol, task.id, TaskStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert!(updated.completed_at.is_none());

    h.settle().await;
    let entries = h
        .activity_entries(task_log(&task, ActivityAction::TaskStatusChanged))
        .await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].performed_by, h.carol.id);
    assert_eq!(
        entries[0].metadata,
        Some(json!({ "from": "TODO", "to": "IN_PROGRESS" }))
    );

    let dave_inbox = h.notifications_for(&h.dave).await;
    assert_eq!(dave_inbox.len(), 1);
    assert_eq!(dave_inbox[0].notification_type, NotificationType::TaskStatusChanged);
    assert_eq!(dave_inbox[0].triggered_by, h.carol.id);
    assert_eq!(dave_inbox[0].related, Some(EntityRef::Task(task.id)));
    assert!(h.notifications_for(&h.carol).await.is_empty());
}

#[tokio::test]
async fn finishing_review_stamps_completion_and_tells_creator() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;
    force_status(&h, &task, &[TaskStatus::InProgress, TaskStatus::InReview]).await;

    let done = h
        .tasks
        .change_status(&h.carol, task.id, TaskStatus::Done)
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Done);
    assert!(done.completed_at.is_some());

    h.settle().await;
    let dave_inbox = h.notifications_for(&h.dave).await;
    assert_eq!(dave_inbox.len(), 1);
    assert!(dave_inbox[0].message.contains("IN_REVIEW"));
    assert!(dave_inbox[0].message.contains("DONE"));
}

#[tokio::test]
async fn reopening_done_task_clears_completion() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;
    force_status(&h, &task, &[TaskStatus::InProgress, TaskStatus::InReview]).await;
    h.tasks
        .change_status(&h.carol, task.id, TaskStatus::Done)
        .await
        .unwrap();

    let reopened = h
        .tasks
        .change_status(&h.dave, task.id, TaskStatus::Todo)
        .await
        .unwrap();
    assert_eq!(reopened.status, TaskStatus::Todo);
    assert!(reopened.completed_at.is_none());
}

#[tokio::test]
async fn only_privileged_roles_leave_blocker() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;
    force_status(&h, &task, &[TaskStatus::InProgress, TaskStatus::Blocker]).await;

    let err = h
        .tasks
        .change_status(&h.carol, task.id, TaskStatus::Todo)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::Forbidden { .. }));

    let moved = h
        .tasks
        .change_status(&h.ada, task.id, TaskStatus::Todo)
        .await
        .unwrap();
    assert_eq!(moved.status, TaskStatus::Todo);
}

#[tokio::test]
async fn member_cannot_move_someone_elses_task() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let err = h
        .tasks
        .change_status(&h.bob, task.id, TaskStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::Forbidden { .. }));

    let stored = h.tasks.get_task(&h.dave, task.id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Todo);
}

#[tokio::test]
async fn illegal_transition_lists_allowed_targets() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let err = h
        .tasks
        .change_status(&h.carol, task.id, TaskStatus::Done)
        .await
        .unwrap_err();
    match &err {
        TaskhubError::InvalidTransition { from, to, allowed } => {
            assert_eq!(from, "TODO");
            assert_eq!(to, "DONE");
            assert_eq!(allowed, "IN_PROGRESS");
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }
    assert!(err.to_string().contains("allowed: IN_PROGRESS"));

    h.settle().await;
    assert!(h.all_notifications().await.is_empty());
}

#[tokio::test]
async fn self_loop_is_an_invalid_transition() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let err = h
        .tasks
        .change_status(&h.dave, task.id, TaskStatus::Todo)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::InvalidTransition { .. }));
}

#[tokio::test]
async fn actor_is_never_notified_of_own_change() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.dave)).await;

    h.tasks
        .change_status(&h.dave, task.id, TaskStatus::InProgress)
        .await
        .unwrap();
    h.settle().await;

    assert!(h.all_notifications().await.is_empty());
    assert!(h.email.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn notify_suppresses_self_notification() {
    let h = Harness::new().await;
    let created = h
        .notifications
        .notify(CreateNotification {
            tenant_id: h.tenant_id,
            recipient_id: h.carol.id,
            triggered_by: h.carol.id,
            notification_type: NotificationType::TaskAssigned,
            message: "to myself".into(),
            related: None,
        })
        .await
        .unwrap();
    assert!(created.is_none());
    assert!(h.notifications_for(&h.carol).await.is_empty());
}

#[tokio::test]
async fn other_tenants_tasks_are_invisible() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;
    let outsider = h.outside_admin().await;

    let err = h
        .tasks
        .change_status(&outsider, task.id, TaskStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::NotFound { .. }));

    let stored = h.tasks.get_task(&h.dave, task.id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Todo);
}

// ---------------------------------------------------------------------------
// Concurrent writers
// ---------------------------------------------------------------------------

/// Lets another writer move the task between our read and our write.
struct RacingTasks<T> {
    inner: T,
    race: Mutex<Option<(TaskStatus, TaskStatus)>>,
}

impl<T> RacingTasks<T> {
    fn new(inner: T, from: TaskStatus, to: TaskStatus) -> Self {
        Self {
            inner,
            race: Mutex::new(Some((from, to))),
        }
    }
}

impl<T: TaskRepository> TaskRepository for RacingTasks<T> {
    async fn create(&self, input: CreateTask) -> TaskhubResult<Task> {
        self.inner.create(input).await
    }

    async fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Task> {
        self.inner.get_by_id(tenant_id, id, include_deleted).await
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: TaskStatus,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> TaskhubResult<Task> {
        let race = self.race.lock().unwrap().take();
        if let Some((from, to)) = race {
            self.inner
                .update_status(tenant_id, id, from, to, None)
                .await?;
        }
        self.inner
            .update_status(tenant_id, id, expected, status, completed_at)
            .await
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: TaskStatus,
        patch: TaskPatch,
    ) -> TaskhubResult<Task> {
        self.inner.update(tenant_id, id, expected, patch).await
    }

    async fn list_by_project(
        &self,
        tenant_id: Uuid,
        project_id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Vec<Task>> {
        self.inner
            .list_by_project(tenant_id, project_id, include_deleted)
            .await
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> TaskhubResult<()> {
        self.inner.delete(tenant_id, id).await
    }
}

/// Every conditional write loses.
struct AlwaysConflicting<T> {
    inner: T,
    attempts: Arc<AtomicUsize>,
}

impl<T: TaskRepository> TaskRepository for AlwaysConflicting<T> {
    async fn create(&self, input: CreateTask) -> TaskhubResult<Task> {
        self.inner.create(input).await
    }

    async fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Task> {
        self.inner.get_by_id(tenant_id, id, include_deleted).await
    }

    async fn update_status(
        &self,
        _tenant_id: Uuid,
        id: Uuid,
        _expected: TaskStatus,
        _status: TaskStatus,
        _completed_at: Option<DateTime<Utc>>,
    ) -> TaskhubResult<Task> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TaskhubError::Conflict {
            entity: "task".into(),
            id: id.to_string(),
        })
    }

    async fn update(
        &self,
        _tenant_id: Uuid,
        id: Uuid,
        _expected: TaskStatus,
        _patch: TaskPatch,
    ) -> TaskhubResult<Task> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TaskhubError::Conflict {
            entity: "task".into(),
            id: id.to_string(),
        })
    }

    async fn list_by_project(
        &self,
        tenant_id: Uuid,
        project_id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Vec<Task>> {
        self.inner
            .list_by_project(tenant_id, project_id, include_deleted)
            .await
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> TaskhubResult<()> {
        self.inner.delete(tenant_id, id).await
    }
}

#[tokio::test]
async fn losing_writer_reevaluates_against_fresh_status() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;
    let tasks = h.tasks_over(RacingTasks::new(
        h.task_repo(),
        TaskStatus::Todo,
        TaskStatus::InProgress,
    ));

    // Both writers wanted TODO -> IN_PROGRESS; after the retry the
    // request is a self-loop.
    let err = tasks
        .change_status(&h.carol, task.id, TaskStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::InvalidTransition { .. }));

    let stored = h.tasks.get_task(&h.carol, task.id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::InProgress);

    h.settle().await;
    assert!(
        h.activity_entries(task_log(&task, ActivityAction::TaskStatusChanged))
            .await
            .is_empty()
    );
    assert!(h.all_notifications().await.is_empty());
}

#[tokio::test]
async fn retry_succeeds_when_move_is_still_legal() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;
    force_status(&h, &task, &[TaskStatus::InProgress]).await;
    let tasks = h.tasks_over(RacingTasks::new(
        h.task_repo(),
        TaskStatus::InProgress,
        TaskStatus::InReview,
    ));

    let updated = tasks
        .change_status(&h.dave, task.id, TaskStatus::Blocker)
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::Blocker);

    h.settle().await;
    let entries = h
        .activity_entries(task_log(&task, ActivityAction::TaskStatusChanged))
        .await;
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].metadata,
        Some(json!({ "from": "IN_REVIEW", "to": "BLOCKER" }))
    );
}

#[tokio::test]
async fn second_conflict_is_returned() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let tasks = h.tasks_over(AlwaysConflicting {
        inner: h.task_repo(),
        attempts: Arc::clone(&attempts),
    });

    let err = tasks
        .change_status(&h.carol, task.id, TaskStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::Conflict { .. }));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);

    let err = tasks
        .assign(&h.dave, task.id, Some(h.bob.id))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::Conflict { .. }));

    let err = tasks
        .update_task(
            &h.dave,
            task.id,
            UpdateTask {
                title: Some("Renamed".into()),
                ..UpdateTask::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::Conflict { .. }));
    assert_eq!(attempts.load(Ordering::SeqCst), 6);

    h.settle().await;
    assert!(h.all_notifications().await.is_empty());
    assert!(h.activity_entries(ActivityLogFilter::default()).await.is_empty());
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reassignment_notifies_new_assignee() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let updated = h.tasks.assign(&h.dave, task.id, Some(h.bob.id)).await.unwrap();
    assert_eq!(updated.assignee_id, Some(h.bob.id));

    h.settle().await;
    let bob_inbox = h.notifications_for(&h.bob).await;
    assert_eq!(bob_inbox.len(), 1);
    assert_eq!(bob_inbox[0].notification_type, NotificationType::TaskAssigned);

    let entries = h
        .activity_entries(task_log(&task, ActivityAction::TaskAssigned))
        .await;
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].metadata,
        Some(json!({ "from": h.carol.id, "to": h.bob.id }))
    );
}

#[tokio::test]
async fn assigning_current_assignee_is_a_no_op() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let same = h.tasks.assign(&h.dave, task.id, Some(h.carol.id)).await.unwrap();
    assert_eq!(same.assignee_id, Some(h.carol.id));

    h.settle().await;
    assert!(h.all_notifications().await.is_empty());
    assert!(
        h.activity_entries(task_log(&task, ActivityAction::TaskAssigned))
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn unassigning_logs_but_notifies_nobody() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let updated = h.tasks.assign(&h.ada, task.id, None).await.unwrap();
    assert!(updated.assignee_id.is_none());

    h.settle().await;
    assert!(h.all_notifications().await.is_empty());
    assert_eq!(
        h.activity_entries(task_log(&task, ActivityAction::TaskAssigned))
            .await
            .len(),
        1
    );
}

#[tokio::test]
async fn members_cannot_assign() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let err = h
        .tasks
        .assign(&h.carol, task.id, Some(h.bob.id))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::Forbidden { .. }));
}

#[tokio::test]
async fn assignee_must_belong_to_tenant() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, None).await;

    let err = h
        .tasks
        .assign(&h.dave, task.id, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// Create, update, delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_task_takes_tenant_and_creator_from_actor() {
    let h = Harness::new().await;
    let task = h
        .tasks
        .create_task(
            &h.dave,
            CreateTask {
                tenant_id: Uuid::new_v4(),
                project_id: h.project_id,
                title: "  Draft press release  ".into(),
                description: "one page".into(),
                assignee_id: Some(h.carol.id),
                creator_id: h.ada.id,
                priority: TaskPriority::High,
                due_date: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(task.tenant_id, h.tenant_id);
    assert_eq!(task.creator_id, h.dave.id);
    assert_eq!(task.title, "Draft press release");
    assert_eq!(task.status, TaskStatus::Todo);

    h.settle().await;
    let carol_inbox = h.notifications_for(&h.carol).await;
    assert_eq!(carol_inbox.len(), 1);
    assert_eq!(carol_inbox[0].notification_type, NotificationType::TaskAssigned);
    assert_eq!(
        h.activity_entries(task_log(&task, ActivityAction::TaskCreated))
            .await
            .len(),
        1
    );
}

#[tokio::test]
async fn members_cannot_create_tasks() {
    let h = Harness::new().await;
    let err = h
        .tasks
        .create_task(
            &h.carol,
            CreateTask {
                tenant_id: h.tenant_id,
                project_id: h.project_id,
                title: "Sneaky".into(),
                description: String::new(),
                assignee_id: None,
                creator_id: h.carol.id,
                priority: TaskPriority::Low,
                due_date: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::Forbidden { .. }));
}

#[tokio::test]
async fn member_update_with_other_fields_is_rejected() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let err = h
        .tasks
        .update_task(
            &h.carol,
            task.id,
            UpdateTask {
                title: Some("Mine now".into()),
                status: Some(TaskStatus::InProgress),
                ..UpdateTask::default()
            },
        )
        .await
        .unwrap_err();
    match err {
        TaskhubError::InvalidOperation { reason } => assert!(reason.contains("title")),
        other => panic!("expected InvalidOperation, got {other:?}"),
    }

    let err = h
        .tasks
        .update_task(&h.carol, task.id, UpdateTask::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::InvalidOperation { .. }));

    let stored = h.tasks.get_task(&h.carol, task.id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Todo);
    assert_eq!(stored.title, task.title);
}

#[tokio::test]
async fn member_status_only_update_goes_through_status_machine() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let updated = h
        .tasks
        .update_task(
            &h.carol,
            task.id,
            UpdateTask {
                status: Some(TaskStatus::InProgress),
                ..UpdateTask::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::InProgress);

    let err = h
        .tasks
        .update_task(
            &h.carol,
            task.id,
            UpdateTask {
                status: Some(TaskStatus::Done),
                ..UpdateTask::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::InvalidTransition { .. }));
}

#[tokio::test]
async fn manager_update_writes_everything_and_logs_each_part() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let updated = h
        .tasks
        .update_task(
            &h.dave,
            task.id,
            UpdateTask {
                title: Some("Final launch copy".into()),
                priority: Some(TaskPriority::Urgent),
                assignee_id: Some(Some(h.bob.id)),
                status: Some(TaskStatus::InProgress),
                ..UpdateTask::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Final launch copy");
    assert_eq!(updated.priority, TaskPriority::Urgent);
    assert_eq!(updated.assignee_id, Some(h.bob.id));
    assert_eq!(updated.status, TaskStatus::InProgress);

    h.settle().await;
    for action in [
        ActivityAction::TaskUpdated,
        ActivityAction::TaskStatusChanged,
        ActivityAction::TaskAssigned,
    ] {
        assert_eq!(
            h.activity_entries(task_log(&task, action)).await.len(),
            1,
            "{action:?}"
        );
    }

    let bob_inbox = h.notifications_for(&h.bob).await;
    let kinds: Vec<_> = bob_inbox.iter().map(|n| n.notification_type).collect();
    assert_eq!(kinds, vec![NotificationType::TaskAssigned]);
    assert!(
        h.all_notifications()
            .await
            .iter()
            .all(|n| n.notification_type != NotificationType::TaskStatusChanged)
    );
}

#[tokio::test]
async fn combined_move_and_reassign_tells_new_assignee_once() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    h.tasks
        .update_task(
            &h.ada,
            task.id,
            UpdateTask {
                assignee_id: Some(Some(h.bob.id)),
                status: Some(TaskStatus::InProgress),
                ..UpdateTask::default()
            },
        )
        .await
        .unwrap();

    h.settle().await;
    let bob_inbox = h.notifications_for(&h.bob).await;
    assert_eq!(bob_inbox.len(), 1);
    assert_eq!(bob_inbox[0].notification_type, NotificationType::TaskAssigned);

    let dave_inbox = h.notifications_for(&h.dave).await;
    assert_eq!(dave_inbox.len(), 1);
    assert_eq!(dave_inbox[0].notification_type, NotificationType::TaskStatusChanged);
    assert!(h.notifications_for(&h.carol).await.is_empty());
}

#[tokio::test]
async fn unchanged_status_in_full_update_is_ignored() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let updated = h
        .tasks
        .update_task(
            &h.dave,
            task.id,
            UpdateTask {
                description: Some("now with details".into()),
                status: Some(TaskStatus::Todo),
                ..UpdateTask::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::Todo);
    assert_eq!(updated.description, "now with details");

    h.settle().await;
    assert!(
        h.activity_entries(task_log(&task, ActivityAction::TaskStatusChanged))
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn full_update_rejects_blank_title_and_illegal_status() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let err = h
        .tasks
        .update_task(
            &h.dave,
            task.id,
            UpdateTask {
                title: Some("   ".into()),
                ..UpdateTask::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::Validation { .. }));

    let err = h
        .tasks
        .update_task(
            &h.dave,
            task.id,
            UpdateTask {
                title: Some("Still valid".into()),
                status: Some(TaskStatus::Done),
                ..UpdateTask::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskhubError::InvalidTransition { .. }));

    let stored = h.tasks.get_task(&h.dave, task.id).await.unwrap();
    assert_eq!(stored.title, task.title);
}

#[tokio::test]
async fn deleting_a_task_hides_it_and_is_logged() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;

    let err = h.tasks.delete_task(&h.carol, task.id).await.unwrap_err();
    assert!(matches!(err, TaskhubError::Forbidden { .. }));

    h.tasks.delete_task(&h.ada, task.id).await.unwrap();
    let err = h.tasks.get_task(&h.ada, task.id).await.unwrap_err();
    assert!(matches!(err, TaskhubError::NotFound { .. }));

    h.settle().await;
    assert_eq!(
        h.activity_entries(task_log(&task, ActivityAction::TaskDeleted))
            .await
            .len(),
        1
    );
}

// ---------------------------------------------------------------------------
// Side-effect failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broken_log_and_notification_storage_never_fail_the_write() {
    let h = Harness::new().await;
    let task = h.seed_task(&h.dave, Some(&h.carol)).await;
    let (tasks, effects) = h.tasks_with_broken_storage();

    let moved = tasks
        .change_status(&h.carol, task.id, TaskStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(moved.status, TaskStatus::InProgress);

    let assigned = tasks.assign(&h.dave, task.id, Some(h.bob.id)).await.unwrap();
    assert_eq!(assigned.assignee_id, Some(h.bob.id));

    effects.flush().await;
    // Status change: log entry and the creator's notification.
    // Assignment: log entry and the new assignee's notification.
    assert_eq!(effects.failure_count(), 4);
    assert_eq!(effects.pending(), 0);

    let stored = h
        .task_repo()
        .get_by_id(h.tenant_id, task.id, false)
        .await
        .unwrap();
    assert_eq!(stored.status, TaskStatus::InProgress);
    assert_eq!(stored.assignee_id, Some(h.bob.id));
    assert!(h.email.sent.lock().unwrap().is_empty());
}
