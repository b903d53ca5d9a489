//! Activity log recording.

use std::sync::Arc;

use taskhub_core::models::activity::{ActivityAction, CreateActivityLogEntry};
use taskhub_core::models::member::Actor;
use taskhub_core::models::reference::EntityRef;
use taskhub_core::repository::ActivityLogRepository;

use crate::side_effect::SideEffects;

/// Appends audit entries without making callers wait on, or fail
/// because of, the log.
pub struct ActivityRecorder<A> {
    repo: Arc<A>,
    effects: SideEffects,
}

impl<A> Clone for ActivityRecorder<A> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            effects: self.effects.clone(),
        }
    }
}

impl<A: ActivityLogRepository + 'static> ActivityRecorder<A> {
    pub fn new(repo: Arc<A>, effects: SideEffects) -> Self {
        Self { repo, effects }
    }

    pub fn record(
        &self,
        actor: &Actor,
        action: ActivityAction,
        target: Option<EntityRef>,
        description: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) {
        let entry = CreateActivityLogEntry {
            tenant_id: actor.tenant_id,
            action,
            description: description.into(),
            performed_by: actor.id,
            target,
            metadata,
        };
        let repo = Arc::clone(&self.repo);
        self.effects.spawn("activity_log", async move {
            repo.append(entry).await.map(|_| ())
        });
    }
}
