//! Error types for taskhub.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskhubError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Invalid transition: cannot move task from {from} to {to}; allowed: {allowed}")]
    InvalidTransition {
        from: String,
        to: String,
        allowed: String,
    },

    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    #[error("Conflict: {entity} {id} was modified concurrently")]
    Conflict { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TaskhubError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type TaskhubResult<T> = Result<T, TaskhubError>;
