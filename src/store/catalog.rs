//! # Catalog
//!
//! In-memory tables for authors and books with the indexes that back
//! every store query and constraint:
//!
//! - primary keys for both tables
//! - folded author name → author id (global uniqueness)
//! - (author id, folded title) (per-author uniqueness)
//! - author id → book rows (the include-books join)
//!
//! Rows are kept in commit order, which is the listing order.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::errors::{StoreError, StoreResult, UniqueConstraint};
use crate::domain::model::{Author, Book};
use crate::domain::validation::fold_case;
use crate::wal::RecordType;

/// A single insert waiting to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    InsertAuthor(Author),
    InsertBook(Book),
}

impl Mutation {
    pub fn record_type(&self) -> RecordType {
        match self {
            Mutation::InsertAuthor(_) => RecordType::Author,
            Mutation::InsertBook(_) => RecordType::Book,
        }
    }

    /// WAL payload: the entity as JSON
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let bytes = match self {
            Mutation::InsertAuthor(author) => serde_json::to_vec(author)?,
            Mutation::InsertBook(book) => serde_json::to_vec(book)?,
        };
        Ok(bytes)
    }

    /// Rebuild a mutation from a WAL record. COMMIT markers yield `None`.
    pub fn decode(record_type: RecordType, payload: &[u8]) -> StoreResult<Option<Self>> {
        let mutation = match record_type {
            RecordType::Author => Some(Mutation::InsertAuthor(serde_json::from_slice(payload)?)),
            RecordType::Book => Some(Mutation::InsertBook(serde_json::from_slice(payload)?)),
            RecordType::Commit => None,
        };
        Ok(mutation)
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    authors: Vec<Author>,
    author_rows: HashMap<Uuid, usize>,
    author_names: HashMap<String, Uuid>,
    books: Vec<Book>,
    book_ids: HashSet<Uuid>,
    book_titles: HashSet<(Uuid, String)>,
    books_by_author: HashMap<Uuid, Vec<usize>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn find_author(&self, id: Uuid) -> Option<&Author> {
        self.author_rows.get(&id).map(|&row| &self.authors[row])
    }

    pub fn author_name_taken(&self, name: &str) -> bool {
        self.author_names.contains_key(&fold_case(name))
    }

    pub fn book_title_taken(&self, author_id: Uuid, title: &str) -> bool {
        self.book_titles.contains(&(author_id, fold_case(title)))
    }

    /// Books owned by `author_id`, in commit order
    pub fn books_for_author(&self, author_id: Uuid) -> Vec<Book> {
        self.books_by_author
            .get(&author_id)
            .map(|rows| rows.iter().map(|&row| self.books[row].clone()).collect())
            .unwrap_or_default()
    }

    /// Verify a whole batch against the tables and against itself.
    ///
    /// Nothing is modified; a batch that passes can be applied with
    /// [`Catalog::apply_checked`].
    pub fn check_batch(&self, batch: &[Mutation]) -> StoreResult<()> {
        let mut new_author_ids = HashSet::new();
        let mut new_names = HashSet::new();
        let mut new_book_ids = HashSet::new();
        let mut new_titles = HashSet::new();

        for mutation in batch {
            match mutation {
                Mutation::InsertAuthor(author) => {
                    if self.author_rows.contains_key(&author.id) || !new_author_ids.insert(author.id) {
                        return Err(StoreError::DuplicateId(author.id));
                    }
                    let key = fold_case(&author.name);
                    if self.author_names.contains_key(&key) || !new_names.insert(key) {
                        return Err(StoreError::UniqueViolation {
                            constraint: UniqueConstraint::AuthorName,
                            value: author.name.clone(),
                        });
                    }
                }
                Mutation::InsertBook(book) => {
                    if self.book_ids.contains(&book.id) || !new_book_ids.insert(book.id) {
                        return Err(StoreError::DuplicateId(book.id));
                    }
                    if !self.author_rows.contains_key(&book.author_id)
                        && !new_author_ids.contains(&book.author_id)
                    {
                        return Err(StoreError::ForeignKeyViolation(book.author_id));
                    }
                    let key = (book.author_id, fold_case(&book.title));
                    if self.book_titles.contains(&key) || !new_titles.insert(key) {
                        return Err(StoreError::UniqueViolation {
                            constraint: UniqueConstraint::BookTitle,
                            value: book.title.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Insert a batch previously accepted by [`Catalog::check_batch`].
    pub fn apply_checked(&mut self, batch: Vec<Mutation>) {
        for mutation in batch {
            match mutation {
                Mutation::InsertAuthor(author) => {
                    let row = self.authors.len();
                    self.author_rows.insert(author.id, row);
                    self.author_names.insert(fold_case(&author.name), author.id);
                    self.authors.push(author);
                }
                Mutation::InsertBook(book) => {
                    let row = self.books.len();
                    self.book_ids.insert(book.id);
                    self.book_titles.insert((book.author_id, fold_case(&book.title)));
                    self.books_by_author.entry(book.author_id).or_default().push(row);
                    self.books.push(book);
                }
            }
        }
    }

    /// Check and insert in one step
    pub fn apply(&mut self, batch: Vec<Mutation>) -> StoreResult<()> {
        self.check_batch(&batch)?;
        self.apply_checked(batch);
        Ok(())
    }
}
