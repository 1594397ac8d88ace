//! Domain rule tests
//!
//! Author and book operations end to end over an in-memory catalog store:
//! validation order, case-insensitive uniqueness, lookups, and concurrent
//! writers.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use authors_api::domain::model::{Author, Book};
use authors_api::domain::{AuthorService, FailureKind};
use authors_api::store::{
    AuthorStore, CatalogStore, CatalogTransaction, StoreError, StoreResult, StoreTransaction,
};
use authors_api::wal::WalError;
use uuid::Uuid;

fn service() -> AuthorService<CatalogStore> {
    AuthorService::new(CatalogStore::in_memory())
}

// =============================================================================
// create_author
// =============================================================================

#[test]
fn blank_author_names_are_invalid() {
    let service = service();
    for name in ["", " ", "\t\n  "] {
        let err = service.create_author(name).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput, "name {:?}", name);
        assert_eq!(err.title(), "Invalid author name");
    }
    assert!(service.list_authors().unwrap().is_empty());
}

#[test]
fn author_names_conflict_regardless_of_case() {
    let service = service();
    service.create_author("Tolkien").unwrap();

    for name in ["Tolkien", "tolkien", "TOLKIEN"] {
        let err = service.create_author(name).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Conflict);
        assert!(err.detail().contains(name));
    }
    assert_eq!(service.list_authors().unwrap().len(), 1);
}

#[test]
fn surrounding_whitespace_is_part_of_the_name() {
    let service = service();
    service.create_author("Tolkien").unwrap();

    let padded = service.create_author(" Tolkien ").unwrap();
    assert_eq!(padded.author.name, " Tolkien ");
    assert_eq!(service.list_authors().unwrap().len(), 2);
}

#[test]
fn listing_returns_authors_in_creation_order_without_books() {
    let service = service();
    let tolkien = service.create_author("Tolkien").unwrap();
    service.create_author("Rowling").unwrap();
    service.create_book(tolkien.id(), "The Hobbit").unwrap();

    let authors = service.list_authors().unwrap();
    assert!(authors.iter().all(|a| a.books.is_empty()));

    let names: Vec<_> = authors.into_iter().map(|a| a.author.name).collect();
    assert_eq!(names, vec!["Tolkien", "Rowling"]);
}

// =============================================================================
// get_author
// =============================================================================

#[test]
fn nil_id_is_invalid_before_lookup() {
    let err = service().get_author(Uuid::nil(), true).unwrap_err();
    assert_eq!(err.kind(), FailureKind::InvalidInput);
    assert_eq!(err.title(), "Empty Id");
}

#[test]
fn unknown_id_is_not_found() {
    let id = Uuid::new_v4();
    let err = service().get_author(id, false).unwrap_err();
    assert_eq!(err.kind(), FailureKind::NotFound);
    assert!(err.detail().contains(&id.to_string()));
}

#[test]
fn include_books_controls_nested_books() {
    let service = service();
    let author = service.create_author("Tolkien").unwrap();
    for title in ["The Hobbit", "The Silmarillion", "Unfinished Tales"] {
        service.create_book(author.id(), title).unwrap();
    }

    let with_books = service.get_author(author.id(), true).unwrap();
    assert_eq!(with_books.books.len(), 3);
    assert!(with_books.books.iter().all(|b| b.author_id == author.id()));

    let without = service.get_author(author.id(), false).unwrap();
    assert!(without.books.is_empty());
    assert_eq!(without.author, with_books.author);
}

// =============================================================================
// create_book
// =============================================================================

#[test]
fn blank_title_wins_over_missing_author() {
    let err = service().create_book(Uuid::new_v4(), "   ").unwrap_err();
    assert_eq!(err.kind(), FailureKind::InvalidInput);
    assert_eq!(err.title(), "Invalid Book Title");
}

#[test]
fn book_for_unknown_author_is_not_found() {
    let err = service().create_book(Uuid::new_v4(), "Dune").unwrap_err();
    assert_eq!(err.kind(), FailureKind::NotFound);
}

#[test]
fn book_titles_are_unique_per_author_only() {
    let service = service();
    let tolkien = service.create_author("Tolkien").unwrap();
    let rowling = service.create_author("Rowling").unwrap();

    service.create_book(tolkien.id(), "The Hobbit").unwrap();

    let err = service.create_book(tolkien.id(), "the HOBBIT").unwrap_err();
    assert_eq!(err.kind(), FailureKind::Conflict);
    assert_eq!(err.title(), "Book Title Already Exists");
    assert!(err.detail().contains("Tolkien"));

    let book = service.create_book(rowling.id(), "The Hobbit").unwrap();
    assert_eq!(book.author_id, rowling.id());
}

#[test]
fn tolkien_and_rowling_catalog() {
    let service = service();
    let tolkien = service.create_author("J.R.R. Tolkien").unwrap();
    let rowling = service.create_author("J.K. Rowling").unwrap();

    service.create_book(tolkien.id(), "The Hobbit").unwrap();
    service.create_book(tolkien.id(), "The Lord of the Rings").unwrap();
    service
        .create_book(rowling.id(), "Harry Potter and the Philosopher's Stone")
        .unwrap();

    let tolkien_books: Vec<_> = service
        .get_author(tolkien.id(), true)
        .unwrap()
        .books
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(tolkien_books, vec!["The Hobbit", "The Lord of the Rings"]);

    assert_eq!(service.get_author(rowling.id(), true).unwrap().books.len(), 1);
    assert_eq!(service.store().stats().unwrap().books, 3);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn concurrent_identical_authors_yield_one_winner() {
    const WRITERS: usize = 8;
    let service = Arc::new(service());
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let name = if i % 2 == 0 { "Pratchett" } else { "PRATCHETT" };
            thread::spawn(move || {
                barrier.wait();
                service.create_author(name)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind() == FailureKind::Conflict));
    assert_eq!(service.list_authors().unwrap().len(), 1);
}

#[test]
fn concurrent_identical_titles_yield_one_winner() {
    const WRITERS: usize = 6;
    let service = Arc::new(service());
    let author_id = service.create_author("Le Guin").unwrap().id();
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.create_book(author_id, "Earthsea")
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(winners, 1);
    assert_eq!(service.get_author(author_id, true).unwrap().books.len(), 1);
}

// =============================================================================
// Store failures
// =============================================================================

/// Catalog store whose commits can be switched to fail like a dead disk
struct FlakyStore {
    inner: CatalogStore,
    fail_commits: AtomicBool,
}

struct FlakyTransaction<'a> {
    inner: CatalogTransaction<'a>,
    fail: bool,
}

impl AuthorStore for FlakyStore {
    type Transaction<'a> = FlakyTransaction<'a>;

    fn begin(&self) -> StoreResult<FlakyTransaction<'_>> {
        Ok(FlakyTransaction {
            inner: self.inner.begin()?,
            fail: self.fail_commits.load(Ordering::SeqCst),
        })
    }

    fn list_authors(&self) -> StoreResult<Vec<Author>> {
        self.inner.list_authors()
    }

    fn find_author_by_id(&self, id: Uuid) -> StoreResult<Option<Author>> {
        self.inner.find_author_by_id(id)
    }

    fn books_for_author(&self, author_id: Uuid) -> StoreResult<Vec<Book>> {
        self.inner.books_for_author(author_id)
    }
}

impl StoreTransaction for FlakyTransaction<'_> {
    fn find_author_by_id(&self, id: Uuid) -> StoreResult<Option<Author>> {
        self.inner.find_author_by_id(id)
    }

    fn exists_author_with_name(&self, name: &str) -> StoreResult<bool> {
        self.inner.exists_author_with_name(name)
    }

    fn exists_book_with_title_for_author(&self, author_id: Uuid, title: &str) -> StoreResult<bool> {
        self.inner.exists_book_with_title_for_author(author_id, title)
    }

    fn insert_author(&mut self, author: Author) {
        self.inner.insert_author(author);
    }

    fn insert_book(&mut self, book: Book) {
        self.inner.insert_book(book);
    }

    fn commit(self) -> StoreResult<()> {
        if self.fail {
            return Err(StoreError::Wal(WalError::fsync_failed(
                "fsync failed after WAL commit",
                io::Error::new(io::ErrorKind::Other, "device removed"),
            )));
        }
        self.inner.commit()
    }
}

fn flaky_service() -> AuthorService<FlakyStore> {
    AuthorService::new(FlakyStore {
        inner: CatalogStore::in_memory(),
        fail_commits: AtomicBool::new(false),
    })
}

#[test]
fn failed_author_commit_is_store_error_and_leaves_nothing() {
    let service = flaky_service();
    service.create_author("Tolkien").unwrap();
    service.store().fail_commits.store(true, Ordering::SeqCst);

    let err = service.create_author("Rowling").unwrap_err();
    assert_eq!(err.kind(), FailureKind::StoreError);
    assert_eq!(err.status_code(), 500);
    assert!(err.detail().contains("fsync"));

    let names: Vec<_> = service
        .list_authors()
        .unwrap()
        .into_iter()
        .map(|a| a.author.name)
        .collect();
    assert_eq!(names, vec!["Tolkien"]);

    // The rejected name was never taken
    service.store().fail_commits.store(false, Ordering::SeqCst);
    service.create_author("Rowling").unwrap();
}

#[test]
fn failed_book_commit_is_store_error_and_leaves_nothing() {
    let service = flaky_service();
    let author = service.create_author("Tolkien").unwrap();
    service.create_book(author.id(), "The Hobbit").unwrap();
    service.store().fail_commits.store(true, Ordering::SeqCst);

    let err = service.create_book(author.id(), "The Silmarillion").unwrap_err();
    assert_eq!(err.kind(), FailureKind::StoreError);

    let titles: Vec<_> = service
        .store()
        .books_for_author(author.id())
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(titles, vec!["The Hobbit"]);
}
