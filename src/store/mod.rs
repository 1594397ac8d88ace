//! # Store
//!
//! The persistence contract the domain layer depends on, and the catalog
//! store that implements it.
//!
//! Writes go through a [`StoreTransaction`] obtained from
//! [`AuthorStore::begin`]. Only one transaction is open at a time, so a
//! uniqueness check and the insert that follows it cannot interleave with
//! another writer. Dropping a transaction without committing discards it.

mod catalog;
mod catalog_store;
mod errors;
pub mod recovery;

pub use catalog::{Catalog, Mutation};
pub use catalog_store::{CatalogStore, CatalogTransaction, StoreStats};
pub use errors::{StoreError, StoreResult, UniqueConstraint};

use uuid::Uuid;

use crate::domain::model::{Author, Book};

/// Storage collaborator for the domain operations
pub trait AuthorStore: Send + Sync {
    /// Write transaction type
    type Transaction<'a>: StoreTransaction
    where
        Self: 'a;

    /// Open the single write transaction, waiting for any other writer.
    fn begin(&self) -> StoreResult<Self::Transaction<'_>>;

    /// All committed authors, in commit order
    fn list_authors(&self) -> StoreResult<Vec<Author>>;

    /// Committed author by id
    fn find_author_by_id(&self, id: Uuid) -> StoreResult<Option<Author>>;

    /// Committed books owned by `author_id`, in commit order
    fn books_for_author(&self, author_id: Uuid) -> StoreResult<Vec<Book>>;
}

/// A unit of work: reads see committed rows plus this transaction's own
/// pending inserts.
pub trait StoreTransaction {
    fn find_author_by_id(&self, id: Uuid) -> StoreResult<Option<Author>>;

    /// Case-insensitive name lookup
    fn exists_author_with_name(&self, name: &str) -> StoreResult<bool>;

    /// Case-insensitive title lookup scoped to one author
    fn exists_book_with_title_for_author(&self, author_id: Uuid, title: &str) -> StoreResult<bool>;

    fn insert_author(&mut self, author: Author);

    fn insert_book(&mut self, book: Book);

    /// Make every pending insert durable and visible, or none of them.
    fn commit(self) -> StoreResult<()>;
}
