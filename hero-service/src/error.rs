//! Process-level errors
//!
//! Returned from configuration loading, pool creation and server startup.
//! Request handling uses [`crate::handlers::ApiError`] instead.

use thiserror::Error;

use crate::repository::RepositoryError;

/// Startup and runtime failure
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Database pool could not be created
    #[error("Database error: {0}")]
    Database(String),

    /// Redis pool could not be created
    #[error("Redis error: {0}")]
    Redis(String),

    /// Store failure outside a request
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

/// Result alias for process-level operations
pub type Result<T> = std::result::Result<T, Error>;
