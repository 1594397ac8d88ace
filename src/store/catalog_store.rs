//! # Catalog Store
//!
//! [`AuthorStore`] over an in-memory [`Catalog`], optionally journaled to a
//! write-ahead log.
//!
//! - `writer` is the single-writer lock. A transaction holds it from
//!   `begin` until commit or drop.
//! - `catalog` holds committed rows only. Readers take its read lock;
//!   a commit takes the write lock just long enough to insert.
//! - In durable mode a commit is written and fsynced to the WAL before
//!   the rows become visible.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock};

use uuid::Uuid;

use super::catalog::{Catalog, Mutation};
use super::errors::StoreResult;
use super::recovery;
use super::{AuthorStore, StoreTransaction};
use crate::domain::model::{Author, Book};
use crate::domain::validation::eq_ignore_case;
use crate::wal::WalWriter;

/// Row counts for health reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub authors: usize,
    pub books: usize,
}

pub struct CatalogStore {
    catalog: RwLock<Catalog>,
    writer: Mutex<Option<WalWriter>>,
    data_dir: Option<PathBuf>,
}

impl CatalogStore {
    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            catalog: RwLock::new(Catalog::new()),
            writer: Mutex::new(None),
            data_dir: None,
        }
    }

    /// Open (or create) a durable store under `data_dir`, replaying its WAL.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        let recovered = recovery::replay(data_dir)?;
        let writer = WalWriter::open(data_dir, recovered.next_sequence)?;

        tracing::info!(
            data_dir = %data_dir.display(),
            authors = recovered.catalog.author_count(),
            books = recovered.catalog.book_count(),
            batches = recovered.committed_batches,
            "store recovered from WAL"
        );

        Ok(Self {
            catalog: RwLock::new(recovered.catalog),
            writer: Mutex::new(Some(writer)),
            data_dir: Some(data_dir.to_path_buf()),
        })
    }

    pub fn is_durable(&self) -> bool {
        self.data_dir.is_some()
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn stats(&self) -> StoreResult<StoreStats> {
        let catalog = self.catalog.read()?;
        Ok(StoreStats {
            authors: catalog.author_count(),
            books: catalog.book_count(),
        })
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl AuthorStore for CatalogStore {
    type Transaction<'a> = CatalogTransaction<'a>;

    fn begin(&self) -> StoreResult<CatalogTransaction<'_>> {
        let writer = self.writer.lock()?;
        Ok(CatalogTransaction {
            store: self,
            writer,
            pending: Vec::new(),
        })
    }

    fn list_authors(&self) -> StoreResult<Vec<Author>> {
        Ok(self.catalog.read()?.authors().to_vec())
    }

    fn find_author_by_id(&self, id: Uuid) -> StoreResult<Option<Author>> {
        Ok(self.catalog.read()?.find_author(id).cloned())
    }

    fn books_for_author(&self, author_id: Uuid) -> StoreResult<Vec<Book>> {
        Ok(self.catalog.read()?.books_for_author(author_id))
    }
}

/// Write transaction over a [`CatalogStore`]
pub struct CatalogTransaction<'a> {
    store: &'a CatalogStore,
    writer: MutexGuard<'a, Option<WalWriter>>,
    pending: Vec<Mutation>,
}

impl CatalogTransaction<'_> {
    fn pending_authors(&self) -> impl Iterator<Item = &Author> {
        self.pending.iter().filter_map(|m| match m {
            Mutation::InsertAuthor(author) => Some(author),
            Mutation::InsertBook(_) => None,
        })
    }

    fn pending_books(&self) -> impl Iterator<Item = &Book> {
        self.pending.iter().filter_map(|m| match m {
            Mutation::InsertBook(book) => Some(book),
            Mutation::InsertAuthor(_) => None,
        })
    }
}

impl StoreTransaction for CatalogTransaction<'_> {
    fn find_author_by_id(&self, id: Uuid) -> StoreResult<Option<Author>> {
        if let Some(author) = self.pending_authors().find(|a| a.id == id) {
            return Ok(Some(author.clone()));
        }
        Ok(self.store.catalog.read()?.find_author(id).cloned())
    }

    fn exists_author_with_name(&self, name: &str) -> StoreResult<bool> {
        if self.pending_authors().any(|a| eq_ignore_case(&a.name, name)) {
            return Ok(true);
        }
        Ok(self.store.catalog.read()?.author_name_taken(name))
    }

    fn exists_book_with_title_for_author(&self, author_id: Uuid, title: &str) -> StoreResult<bool> {
        if self
            .pending_books()
            .any(|b| b.author_id == author_id && eq_ignore_case(&b.title, title))
        {
            return Ok(true);
        }
        Ok(self.store.catalog.read()?.book_title_taken(author_id, title))
    }

    fn insert_author(&mut self, author: Author) {
        self.pending.push(Mutation::InsertAuthor(author));
    }

    fn insert_book(&mut self, book: Book) {
        self.pending.push(Mutation::InsertBook(book));
    }

    fn commit(mut self) -> StoreResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);

        // Constraints are checked before anything reaches the log. No other
        // writer can run until this guard drops, so the check still holds
        // when the batch is applied below.
        self.store.catalog.read()?.check_batch(&batch)?;

        if let Some(wal) = self.writer.as_mut() {
            let entries = batch
                .iter()
                .map(|m| Ok((m.record_type(), m.encode()?)))
                .collect::<StoreResult<Vec<_>>>()?;
            wal.append_commit(&entries)?;
        }

        self.store.catalog.write()?.apply_checked(batch);
        Ok(())
    }
}
