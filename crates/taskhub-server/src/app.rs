//! One fully wired set of taskhub services over a SurrealDB connection.

use std::sync::Arc;

use surrealdb::{Connection, Surreal};
use taskhub_auth::{AuthConfig, AuthService};
use taskhub_db::repository::{
    SurrealActivityLogRepository, SurrealCommentRepository, SurrealMemberRepository,
    SurrealNotificationRepository, SurrealProjectRepository, SurrealTaskRepository,
    SurrealTenantRepository,
};
use taskhub_workflow::{
    ActivityRecorder, CommentService, NoEmail, NotificationService, RoomHub, SideEffects,
    TaskService, WorkflowConfig,
};
use tracing::{info, warn};

pub type Auth<C> = AuthService<SurrealTenantRepository<C>, SurrealMemberRepository<C>>;

pub type Tasks<C> = TaskService<
    SurrealTaskRepository<C>,
    SurrealMemberRepository<C>,
    SurrealProjectRepository<C>,
    SurrealActivityLogRepository<C>,
    SurrealNotificationRepository<C>,
    RoomHub,
    NoEmail,
>;

pub type Comments<C> = CommentService<
    SurrealCommentRepository<C>,
    SurrealTaskRepository<C>,
    SurrealMemberRepository<C>,
    SurrealActivityLogRepository<C>,
    SurrealNotificationRepository<C>,
    RoomHub,
    NoEmail,
>;

pub struct App<C: Connection> {
    pub auth: Auth<C>,
    pub tasks: Tasks<C>,
    pub comments: Comments<C>,
    pub hub: Arc<RoomHub>,
    pub effects: SideEffects,
}

fn member_repo<C: Connection>(db: &Surreal<C>, auth: &AuthConfig) -> SurrealMemberRepository<C> {
    match &auth.pepper {
        Some(pepper) => SurrealMemberRepository::with_pepper(db.clone(), pepper.clone()),
        None => SurrealMemberRepository::new(db.clone()),
    }
}

impl<C: Connection> App<C> {
    /// Wire every service over `db`. No email transport is configured,
    /// so notification email is disabled.
    pub fn build(db: Surreal<C>, auth: AuthConfig, workflow: &WorkflowConfig) -> Self {
        let effects = SideEffects::new(workflow.side_effect_timeout);
        let hub = RoomHub::new(auth.clone(), workflow.realtime_buffer);

        let notifications = NotificationService::new(
            Arc::new(SurrealNotificationRepository::new(db.clone())),
            Arc::clone(&hub),
            None::<Arc<NoEmail>>,
            effects.clone(),
        );
        let activity = ActivityRecorder::new(
            Arc::new(SurrealActivityLogRepository::new(db.clone())),
            effects.clone(),
        );
        let members = Arc::new(member_repo(&db, &auth));
        let tasks_repo = Arc::new(SurrealTaskRepository::new(db.clone()));

        let tasks = TaskService::new(
            Arc::clone(&tasks_repo),
            Arc::clone(&members),
            Arc::new(SurrealProjectRepository::new(db.clone())),
            activity.clone(),
            notifications.clone(),
        );
        let comments = CommentService::new(
            Arc::new(SurrealCommentRepository::new(db.clone())),
            tasks_repo,
            Arc::clone(&members),
            activity,
            notifications,
            workflow.max_comment_length,
        );
        let auth = AuthService::new(
            SurrealTenantRepository::new(db.clone()),
            member_repo(&db, &auth),
            auth,
        );

        info!(
            side_effect_timeout_ms = workflow.side_effect_timeout.as_millis() as u64,
            realtime_buffer = workflow.realtime_buffer,
            "services wired"
        );

        Self {
            auth,
            tasks,
            comments,
            hub,
            effects,
        }
    }

    /// Let in-flight side effects finish before the process exits.
    pub async fn shutdown(&self) {
        info!(pending = self.effects.pending(), "draining side effects");
        self.effects.flush().await;

        let failures = self.effects.failure_count();
        if failures > 0 {
            warn!(failures, "side effects failed during this run");
        }
    }
}
