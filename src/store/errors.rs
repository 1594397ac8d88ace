//! # Store Errors

use thiserror::Error;
use uuid::Uuid;

use crate::wal::WalError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Which uniqueness constraint a commit would have broken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueConstraint {
    /// Author name, case-insensitive, global
    AuthorName,
    /// Book title, case-insensitive, per author
    BookTitle,
}

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    // ==================
    // Constraint Violations
    // ==================
    /// A uniqueness constraint rejected the commit
    #[error("Unique constraint {constraint:?} violated by '{value}'")]
    UniqueViolation {
        constraint: UniqueConstraint,
        value: String,
    },

    /// A book referenced an author that does not exist
    #[error("Foreign key violation: author {0} does not exist")]
    ForeignKeyViolation(Uuid),

    /// A primary key was inserted twice
    #[error("Duplicate primary key: {0}")]
    DuplicateId(Uuid),

    // ==================
    // Internal Errors
    // ==================
    /// A lock holder panicked
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// Entity could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Write-ahead log failure
    #[error("{0}")]
    Wal(#[from] WalError),
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::LockPoisoned
    }
}
