use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid sort column: {0}")]
    InvalidColumn(String),

    #[error("Invalid sort direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
}
