//! Task status transition table.
//!
//! ```text
//! TODO        -> IN_PROGRESS
//! IN_PROGRESS -> IN_REVIEW, TODO, BLOCKER
//! IN_REVIEW   -> DONE, IN_PROGRESS, BLOCKER
//! DONE        -> TODO
//! BLOCKER     -> TODO, IN_PROGRESS
//! ```
//!
//! Self-loops are never legal.

use chrono::{DateTime, Utc};

use crate::error::{TaskhubError, TaskhubResult};
use crate::models::task::TaskStatus;

impl TaskStatus {
    /// Statuses reachable from `self` in one step.
    pub fn allowed_transitions(&self) -> &'static [TaskStatus] {
        use TaskStatus::*;
        match self {
            Todo => &[InProgress],
            InProgress => &[InReview, Todo, Blocker],
            InReview => &[Done, InProgress, Blocker],
            Done => &[Todo],
            Blocker => &[Todo, InProgress],
        }
    }

    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

/// Reject `from -> to` unless it is an edge of the table.
///
/// The error lists every status reachable from `from`.
pub fn check_transition(from: TaskStatus, to: TaskStatus) -> TaskhubResult<()> {
    if from.can_transition_to(to) {
        return Ok(());
    }
    let allowed = from
        .allowed_transitions()
        .iter()
        .map(TaskStatus::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Err(TaskhubError::InvalidTransition {
        from: from.as_str().into(),
        to: to.as_str().into(),
        allowed,
    })
}

/// The `completed_at` value a task must carry after moving to `next`.
///
/// Entering `Done` stamps `now` unless a timestamp is already present;
/// any other status clears it.
pub fn completion_after(
    next: TaskStatus,
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match next {
        TaskStatus::Done => current.or(Some(now)),
        _ => None,
    }
}
