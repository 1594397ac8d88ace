//! # Domain Outcome
//!
//! Every domain operation returns [`Outcome<T>`]: the success payload or a
//! [`Failure`] with a kind, a short human title and a detail message.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Result type for domain operations
pub type Outcome<T> = Result<T, Failure>;

/// Failure categories exposed to the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// Caller-supplied data failed a precondition
    InvalidInput,
    /// Operation would break a uniqueness invariant
    Conflict,
    /// Referenced entity does not exist
    NotFound,
    /// Persistence collaborator failed
    StoreError,
}

impl FailureKind {
    /// HTTP status code for this kind
    pub fn status_code(&self) -> u16 {
        match self {
            FailureKind::InvalidInput => 400,
            FailureKind::Conflict => 409,
            FailureKind::NotFound => 404,
            FailureKind::StoreError => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "INVALID_INPUT",
            FailureKind::Conflict => "CONFLICT",
            FailureKind::NotFound => "NOT_FOUND",
            FailureKind::StoreError => "STORE_ERROR",
        }
    }

    /// Whether the caller can fix the request and try again
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FailureKind::StoreError)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured domain failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{kind}] {title}: {detail}")]
pub struct Failure {
    kind: FailureKind,
    title: String,
    detail: String,
}

impl Failure {
    pub fn new(kind: FailureKind, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            detail: detail.into(),
        }
    }

    // ==================
    // Constructors per rule
    // ==================

    pub fn invalid_author_name() -> Self {
        Self::new(
            FailureKind::InvalidInput,
            "Invalid author name",
            "Author name cannot be empty",
        )
    }

    pub fn duplicate_author(name: &str) -> Self {
        Self::new(
            FailureKind::Conflict,
            "Duplicate author",
            format!("Author name '{}' already exists", name),
        )
    }

    pub fn empty_id() -> Self {
        Self::new(FailureKind::InvalidInput, "Empty Id", "Id cannot be empty")
    }

    pub fn author_not_found(id: Uuid) -> Self {
        Self::new(
            FailureKind::NotFound,
            "Author Not Found",
            format!("Author with ID '{}' is not found", id),
        )
    }

    pub fn invalid_book_title() -> Self {
        Self::new(
            FailureKind::InvalidInput,
            "Invalid Book Title",
            "Book title cannot be empty",
        )
    }

    pub fn duplicate_book_title(author_name: &str, title: &str) -> Self {
        Self::new(
            FailureKind::Conflict,
            "Book Title Already Exists",
            format!(
                "Author '{}' has already written a book with the title '{}'",
                author_name, title
            ),
        )
    }

    pub fn store(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::StoreError, "Storage failure", detail)
    }

    // ==================
    // Accessors
    // ==================

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl From<StoreError> for Failure {
    fn from(err: StoreError) -> Self {
        Failure::store(err.to_string())
    }
}
