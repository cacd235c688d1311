use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::storage::StorageError;

/// Domain failures raised by the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{field}: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Storage backend failure: {0}")]
    StorageUnavailable(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::Sqlx(err))
    }
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::Invalid(message.into())
    }

    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::InvalidField { field, message: message.into() }
    }
}

/// Turn a unique-index violation into a 409 with a readable message
pub fn conflict_on_unique(message: impl Into<String>) -> impl FnOnce(sqlx::Error) -> ServiceError {
    let message = message.into();
    move |err| {
        let db = DatabaseError::Sqlx(err);
        if db.is_unique_violation() {
            ServiceError::Conflict(message)
        } else {
            ServiceError::Database(db)
        }
    }
}

/// Like `conflict_on_unique`, but a violation of `constraint` gets its own message
pub fn conflict_on_constraint(
    constraint: &'static str,
    constraint_message: impl Into<String>,
    message: impl Into<String>,
) -> impl FnOnce(sqlx::Error) -> ServiceError {
    let constraint_message = constraint_message.into();
    let message = message.into();
    move |err| {
        let db = DatabaseError::Sqlx(err);
        if !db.is_unique_violation() {
            ServiceError::Database(db)
        } else if db.violated_constraint() == Some(constraint) {
            ServiceError::Conflict(constraint_message)
        } else {
            ServiceError::Conflict(message)
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
