//! # Entity Model
//!
//! Authors and Books. A Book points at its Author through `author_id`;
//! Authors never hold Book references. Nested books are attached only
//! when building an [`AuthorDetail`] projection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Unique author identifier
    pub id: Uuid,

    /// Display name (unique, case-insensitive)
    pub name: String,
}

impl Author {
    /// Create a new author with a freshly generated id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Book as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique book identifier
    pub id: Uuid,

    /// Title (unique per author, case-insensitive)
    pub title: String,

    /// Owning author
    pub author_id: Uuid,
}

impl Book {
    /// Create a new book owned by `author_id`
    pub fn new(author_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            author_id,
        }
    }
}

/// Author with an optional eager-loaded book list.
///
/// `books` is always serialized; it is empty unless the caller asked for
/// books to be included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDetail {
    #[serde(flatten)]
    pub author: Author,

    #[serde(default)]
    pub books: Vec<Book>,
}

impl AuthorDetail {
    /// Projection without books
    pub fn bare(author: Author) -> Self {
        Self {
            author,
            books: Vec::new(),
        }
    }

    /// Projection with the given books attached
    pub fn with_books(author: Author, books: Vec<Book>) -> Self {
        Self { author, books }
    }

    pub fn id(&self) -> Uuid {
        self.author.id
    }
}

impl From<Author> for AuthorDetail {
    fn from(author: Author) -> Self {
        Self::bare(author)
    }
}
