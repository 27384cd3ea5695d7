//! Repository error types
//!
//! Store failures carry the operation that failed and, when known, the entity
//! involved. Callers above the repository never inspect backend-specific errors.
//!
//! # Example
//!
//! ```rust
//! use hero_service::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("superHero", 42);
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert_eq!(error.entity_id.as_deref(), Some("42"));
//! ```

use std::fmt;

/// Store operation in progress when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Loading a single entity by id
    FindById,
    /// Loading every entity matching a query
    FindAll,
    /// Loading one page of entities matching a query
    FindPage,
    /// Counting entities matching a query
    Count,
    /// Checking whether an id exists
    Exists,
    /// Inserting or overwriting an entity
    Save,
    /// Deleting an entity by id
    Delete,
    /// Connectivity check
    Ping,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindById => write!(f, "find_by_id"),
            Self::FindAll => write!(f, "find_all"),
            Self::FindPage => write!(f, "find_page"),
            Self::Count => write!(f, "count"),
            Self::Exists => write!(f, "exists"),
            Self::Save => write!(f, "save"),
            Self::Delete => write!(f, "delete"),
            Self::Ping => write!(f, "ping"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Entity was not found
    NotFound,
    /// Database constraint violation
    ConstraintViolation,
    /// Failed to reach the store
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// Underlying database error
    DatabaseError,
    /// Other unclassified error
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured repository error with operation context
///
/// ```rust
/// use hero_service::repository::{RepositoryError, RepositoryOperation};
///
/// let error = RepositoryError::database_error(RepositoryOperation::Save, "relation missing")
///     .with_entity("superHero", 7);
/// assert_eq!(
///     error.to_string(),
///     "Repository database_error error during save: relation missing [superHero: 7]"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The type of entity involved
    pub entity_type: Option<String>,
    /// The id of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Entity with the given id does not exist
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl ToString) -> Self {
        Self::new(
            RepositoryOperation::FindById,
            RepositoryErrorKind::NotFound,
            "Entity not found",
        )
        .with_entity(entity_type, entity_id)
    }

    /// Database rejected the write
    pub fn constraint_violation(
        operation: RepositoryOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(operation, RepositoryErrorKind::ConstraintViolation, message)
    }

    /// Store could not be reached
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Ping,
            RepositoryErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Operation did not finish in time
    pub fn timeout(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Timeout, message)
    }

    /// Any other failure reported by the database
    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl ToString) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.to_string());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Transient errors that may succeed on retry
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }

    /// Whether the store is unreachable rather than rejecting the request
    pub fn is_unavailable(&self) -> bool {
        self.kind == RepositoryErrorKind::ConnectionFailed
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(feature = "database")]
impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        // Callers attach the real operation with `with_operation`.
        let operation = RepositoryOperation::FindAll;
        match err {
            sqlx::Error::RowNotFound => Self::new(
                operation,
                RepositoryErrorKind::NotFound,
                "Entity not found",
            ),
            sqlx::Error::PoolTimedOut => {
                Self::timeout(operation, "Timed out waiting for a database connection")
            }
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                Self::connection_failed(err.to_string()).with_operation(operation)
            }
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation() =>
            {
                Self::constraint_violation(operation, db_err.message().to_string())
            }
            other => Self::database_error(operation, other.to_string()),
        }
    }
}

/// Result alias for repository calls
pub type RepositoryResult<T> = Result<T, RepositoryError>;
