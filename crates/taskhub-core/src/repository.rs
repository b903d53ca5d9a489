//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-owned repositories take
//! a `tenant_id` on every call and implementations must filter on it;
//! no method issues an unscoped query. Reads take an explicit
//! `include_deleted` flag; callers in the workflow always pass `false`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TaskhubResult;
use crate::models::{
    activity::{ActivityAction, ActivityLogEntry, CreateActivityLogEntry},
    comment::{Comment, CreateComment},
    member::{CreateMember, Member, MemberRole},
    notification::{CreateNotification, Notification},
    project::{CreateProject, Project},
    reference::EntityRef,
    task::{CreateTask, Task, TaskPatch, TaskStatus},
    tenant::{CreateTenant, Tenant},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Tenant (global scope)
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the slug is taken.
    fn create(&self, input: CreateTenant) -> impl Future<Output = TaskhubResult<Tenant>> + Send;
    fn get_by_id(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> impl Future<Output = TaskhubResult<Tenant>> + Send;
    fn get_by_slug(
        &self,
        slug: &str,
        include_deleted: bool,
    ) -> impl Future<Output = TaskhubResult<Tenant>> + Send;
    /// Soft delete.
    fn delete(&self, id: Uuid) -> impl Future<Output = TaskhubResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait MemberRepository: Send + Sync {
    /// Applies [`MemberRole::for_signup`] and hashes the password.
    fn create(&self, input: CreateMember) -> impl Future<Output = TaskhubResult<Member>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        include_deleted: bool,
    ) -> impl Future<Output = TaskhubResult<Member>> + Send;
    /// Emails are unique system-wide, so this lookup is not tenant-scoped.
    /// It exists for login only.
    fn get_by_email(
        &self,
        email: &str,
        include_deleted: bool,
    ) -> impl Future<Output = TaskhubResult<Member>> + Send;
    fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        include_deleted: bool,
    ) -> impl Future<Output = TaskhubResult<Vec<Member>>> + Send;
    fn update_role(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        role: MemberRole,
    ) -> impl Future<Output = TaskhubResult<Member>> + Send;
    /// Soft delete.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = TaskhubResult<()>> + Send;
}

pub trait ProjectRepository: Send + Sync {
    fn create(&self, input: CreateProject) -> impl Future<Output = TaskhubResult<Project>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        include_deleted: bool,
    ) -> impl Future<Output = TaskhubResult<Project>> + Send;
    fn add_member(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        member_id: Uuid,
    ) -> impl Future<Output = TaskhubResult<Project>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        include_deleted: bool,
        pagination: Pagination,
    ) -> impl Future<Output = TaskhubResult<PaginatedResult<Project>>> + Send;
    /// Soft delete.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = TaskhubResult<()>> + Send;
}

pub trait TaskRepository: Send + Sync {
    fn create(&self, input: CreateTask) -> impl Future<Output = TaskhubResult<Task>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        include_deleted: bool,
    ) -> impl Future<Output = TaskhubResult<Task>> + Send;
    /// Atomically move a task from `expected` to `status`.
    ///
    /// Fails with `Conflict` if the stored status is no longer
    /// `expected`, and `NotFound` if the task does not exist in the
    /// tenant.
    fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: TaskStatus,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> impl Future<Output = TaskhubResult<Task>> + Send;
    /// Apply a patch in one write, guarded by the same status check as
    /// [`TaskRepository::update_status`].
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: TaskStatus,
        patch: TaskPatch,
    ) -> impl Future<Output = TaskhubResult<Task>> + Send;
    fn list_by_project(
        &self,
        tenant_id: Uuid,
        project_id: Uuid,
        include_deleted: bool,
    ) -> impl Future<Output = TaskhubResult<Vec<Task>>> + Send;
    /// Soft delete.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = TaskhubResult<()>> + Send;
}

pub trait CommentRepository: Send + Sync {
    fn create(&self, input: CreateComment) -> impl Future<Output = TaskhubResult<Comment>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        include_deleted: bool,
    ) -> impl Future<Output = TaskhubResult<Comment>> + Send;
    fn list_by_task(
        &self,
        tenant_id: Uuid,
        task_id: Uuid,
        include_deleted: bool,
    ) -> impl Future<Output = TaskhubResult<Vec<Comment>>> + Send;
    /// Soft delete.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = TaskhubResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Notifications (tenant-scoped, append-only apart from the read flag)
// ---------------------------------------------------------------------------

pub trait NotificationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateNotification,
    ) -> impl Future<Output = TaskhubResult<Notification>> + Send;
    /// Newest first.
    fn list_for_recipient(
        &self,
        tenant_id: Uuid,
        recipient_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> impl Future<Output = TaskhubResult<PaginatedResult<Notification>>> + Send;
    /// Only the recipient can mark their own notification.
    fn mark_read(
        &self,
        tenant_id: Uuid,
        recipient_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = TaskhubResult<Notification>> + Send;
    /// Returns how many notifications were flipped.
    fn mark_all_read(
        &self,
        tenant_id: Uuid,
        recipient_id: Uuid,
    ) -> impl Future<Output = TaskhubResult<u64>> + Send;
    fn unread_count(
        &self,
        tenant_id: Uuid,
        recipient_id: Uuid,
    ) -> impl Future<Output = TaskhubResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Activity log (append-only, tenant-scoped)
// ---------------------------------------------------------------------------

/// Query filters for activity log entries.
#[derive(Debug, Clone, Default)]
pub struct ActivityLogFilter {
    pub performed_by: Option<Uuid>,
    pub action: Option<ActivityAction>,
    pub target: Option<EntityRef>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub trait ActivityLogRepository: Send + Sync {
    /// Append a new entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateActivityLogEntry,
    ) -> impl Future<Output = TaskhubResult<ActivityLogEntry>> + Send;
    /// Newest first.
    fn list(
        &self,
        tenant_id: Uuid,
        filter: ActivityLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = TaskhubResult<PaginatedResult<ActivityLogEntry>>> + Send;
}
