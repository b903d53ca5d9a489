//! Database-specific error types and conversions.

use taskhub_core::error::TaskhubError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Concurrent modification of {entity} {id}")]
    Conflict { entity: String, id: String },
}

impl DbError {
    /// Classify a failed statement. Unique-index violations become
    /// `AlreadyExists`; everything else is a plain query failure.
    pub(crate) fn from_check(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for TaskhubError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TaskhubError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => TaskhubError::AlreadyExists { entity },
            DbError::Conflict { entity, id } => TaskhubError::Conflict { entity, id },
            DbError::Hash(msg) => TaskhubError::Crypto(msg),
            other => TaskhubError::Database(other.to_string()),
        }
    }
}
