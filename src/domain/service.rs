//! # Domain Operations
//!
//! Each operation is one unit of work: validate, check the store, insert,
//! commit. The first rule that fails decides the reported failure.
//!
//! Check order:
//!
//! | Operation       | 1                | 2                | 3                |
//! |-----------------|------------------|------------------|------------------|
//! | `create_author` | name non-empty   | name unique      |                  |
//! | `get_author`    | id not nil       | author exists    |                  |
//! | `create_book`   | title non-empty  | author exists    | title unique     |

use uuid::Uuid;

use super::errors::{Failure, Outcome};
use super::model::{Author, AuthorDetail, Book};
use super::validation::validate_non_empty;
use crate::observability::{log_event_with_fields, Event};
use crate::store::{AuthorStore, StoreError, StoreTransaction, UniqueConstraint};

/// Author/book use cases over a store
pub struct AuthorService<S> {
    store: S,
}

impl<S: AuthorStore> AuthorService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create an author with a unique, non-empty name.
    pub fn create_author(&self, name: &str) -> Outcome<AuthorDetail> {
        if validate_non_empty(name).is_err() {
            return Err(Failure::invalid_author_name());
        }

        let mut tx = self.store.begin()?;

        if tx.exists_author_with_name(name)? {
            return Err(Failure::duplicate_author(name));
        }

        let author = Author::new(name);
        tx.insert_author(author.clone());
        tx.commit()
            .map_err(|e| commit_failure(e, || Failure::duplicate_author(name)))?;

        log_event_with_fields(
            Event::AuthorCreated,
            &[("author_id", author.id.to_string().as_str()), ("name", author.name.as_str())],
        );

        Ok(AuthorDetail::bare(author))
    }

    /// Every author, without nested books.
    pub fn list_authors(&self) -> Outcome<Vec<AuthorDetail>> {
        let authors = self.store.list_authors()?;
        Ok(authors.into_iter().map(AuthorDetail::bare).collect())
    }

    /// One author, with its books attached when `include_books` is set.
    pub fn get_author(&self, id: Uuid, include_books: bool) -> Outcome<AuthorDetail> {
        if id.is_nil() {
            return Err(Failure::empty_id());
        }

        let author = self
            .store
            .find_author_by_id(id)?
            .ok_or_else(|| Failure::author_not_found(id))?;

        if include_books {
            let books = self.store.books_for_author(id)?;
            Ok(AuthorDetail::with_books(author, books))
        } else {
            Ok(AuthorDetail::bare(author))
        }
    }

    /// Create a book under an existing author.
    pub fn create_book(&self, author_id: Uuid, title: &str) -> Outcome<Book> {
        if validate_non_empty(title).is_err() {
            return Err(Failure::invalid_book_title());
        }

        let mut tx = self.store.begin()?;

        let author = tx
            .find_author_by_id(author_id)?
            .ok_or_else(|| Failure::author_not_found(author_id))?;

        if tx.exists_book_with_title_for_author(author_id, title)? {
            return Err(Failure::duplicate_book_title(&author.name, title));
        }

        let book = Book::new(author.id, title);
        tx.insert_book(book.clone());
        tx.commit().map_err(|e| match e {
            StoreError::ForeignKeyViolation(id) => Failure::author_not_found(id),
            e => commit_failure(e, || Failure::duplicate_book_title(&author.name, title)),
        })?;

        log_event_with_fields(
            Event::BookCreated,
            &[
                ("author_id", author.id.to_string().as_str()),
                ("book_id", book.id.to_string().as_str()),
                ("title", book.title.as_str()),
            ],
        );

        Ok(book)
    }
}

/// Map a commit error. A unique-constraint rejection reports as the
/// matching conflict; anything else is a storage failure.
fn commit_failure(err: StoreError, conflict: impl FnOnce() -> Failure) -> Failure {
    match err {
        StoreError::UniqueViolation {
            constraint: UniqueConstraint::AuthorName | UniqueConstraint::BookTitle,
            ..
        } => conflict(),
        other => {
            log_event_with_fields(Event::StoreFailure, &[("error", other.to_string().as_str())]);
            Failure::from(other)
        }
    }
}
