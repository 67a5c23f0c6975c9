// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid service id: {0:?}")]
    InvalidServiceId(String),

    #[error("Duplicate service in watch list: {0}")]
    DuplicateService(String),

    #[error("Empty watch list")]
    EmptyWatchList,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
