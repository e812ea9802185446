//! Error types for the AuthGrid system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthGridError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AuthGridResult<T> = Result<T, AuthGridError>;
