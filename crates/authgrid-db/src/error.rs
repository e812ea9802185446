//! Database-specific error types and conversions.

use authgrid_core::error::AuthGridError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Failed to decode record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for AuthGridError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AuthGridError::NotFound { entity, id },
            other => AuthGridError::Database(other.to_string()),
        }
    }
}
