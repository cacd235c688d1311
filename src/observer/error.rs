use thiserror::Error;

/// Observer failures. They are logged by the pipeline and never reach the
/// HTTP caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserverError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Mail error: {0}")]
    MailError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Missing pipeline data: {0}")]
    MissingMetadata(&'static str),
}

impl From<sqlx::Error> for ObserverError {
    fn from(error: sqlx::Error) -> Self {
        ObserverError::DatabaseError(error.to_string())
    }
}

impl From<crate::database::manager::DatabaseError> for ObserverError {
    fn from(error: crate::database::manager::DatabaseError) -> Self {
        ObserverError::DatabaseError(error.to_string())
    }
}
