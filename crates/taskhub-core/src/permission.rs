//! Role-based permission matrix.
//!
//! Every (operation, role) pair is decided by an exhaustive `match`, so
//! adding an operation or a role fails to compile until it is mapped.

use crate::error::{TaskhubError, TaskhubResult};
use crate::models::member::{Actor, MemberRole};
use crate::models::task::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTask,
    UpdateTaskFields,
    ChangeTaskStatus,
    AssignTask,
    DeleteTask,
    CreateComment,
    DeleteAnyComment,
}

impl Operation {
    pub fn is_allowed(&self, role: MemberRole) -> bool {
        use MemberRole::*;
        use Operation::*;
        match (self, role) {
            (_, Admin | Manager) => true,
            (ChangeTaskStatus | CreateComment, Member) => true,
            (
                CreateTask | UpdateTaskFields | AssignTask | DeleteTask | DeleteAnyComment,
                Member,
            ) => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTask => "create tasks",
            Self::UpdateTaskFields => "edit task fields",
            Self::ChangeTaskStatus => "change task status",
            Self::AssignTask => "assign tasks",
            Self::DeleteTask => "delete tasks",
            Self::CreateComment => "comment",
            Self::DeleteAnyComment => "delete other members' comments",
        }
    }
}

/// Fail with `Forbidden` unless `actor` may perform `op`.
pub fn require(actor: &Actor, op: Operation) -> TaskhubResult<()> {
    if op.is_allowed(actor.role) {
        Ok(())
    } else {
        Err(TaskhubError::forbidden(format!(
            "{} may not {}",
            actor.role,
            op.name()
        )))
    }
}

/// Role and ownership checks for changing a task's status.
///
/// A MEMBER may only move tasks assigned to them, and never a task
/// that is currently `Blocker`. ADMIN and MANAGER pass unconditionally;
/// the transition table is checked separately.
pub fn authorize_status_change(actor: &Actor, task: &Task) -> TaskhubResult<()> {
    require(actor, Operation::ChangeTaskStatus)?;
    if actor.role.is_privileged() {
        return Ok(());
    }
    if task.assignee_id != Some(actor.id) {
        return Err(TaskhubError::forbidden("task is not assigned to you"));
    }
    if task.status == TaskStatus::Blocker {
        return Err(TaskhubError::forbidden(
            "only an ADMIN or MANAGER can move a task out of BLOCKER",
        ));
    }
    Ok(())
}
