//! Durable store recovery tests
//!
//! Writes through the domain service, reopens the data directory, and
//! damages the log in the ways a crash or bad disk would.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use authors_api::domain::AuthorService;
use authors_api::store::{AuthorStore, CatalogStore};
use authors_api::wal::wal_path;
use tempfile::TempDir;

fn open(dir: &Path) -> AuthorService<CatalogStore> {
    AuthorService::new(CatalogStore::open(dir).unwrap())
}

#[test]
fn committed_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let (tolkien_id, hobbit_id) = {
        let service = open(dir.path());
        let tolkien = service.create_author("Tolkien").unwrap();
        service.create_author("Rowling").unwrap();
        let hobbit = service.create_book(tolkien.id(), "The Hobbit").unwrap();
        (tolkien.id(), hobbit.id)
    };

    let service = open(dir.path());
    let names: Vec<_> = service
        .list_authors()
        .unwrap()
        .into_iter()
        .map(|a| a.author.name)
        .collect();
    assert_eq!(names, vec!["Tolkien", "Rowling"]);

    let tolkien = service.get_author(tolkien_id, true).unwrap();
    assert_eq!(tolkien.books.len(), 1);
    assert_eq!(tolkien.books[0].id, hobbit_id);
}

#[test]
fn uniqueness_holds_across_restarts() {
    let dir = TempDir::new().unwrap();
    open(dir.path()).create_author("Tolkien").unwrap();

    let service = open(dir.path());
    assert!(service.create_author("tolkien").is_err());
    service.create_author("Le Guin").unwrap();
    assert_eq!(service.store().list_authors().unwrap().len(), 2);
}

#[test]
fn rejected_writes_leave_no_trace_in_the_log() {
    let dir = TempDir::new().unwrap();
    let service = open(dir.path());
    service.create_author("Tolkien").unwrap();
    let len_after_commit = fs::metadata(wal_path(dir.path())).unwrap().len();

    assert!(service.create_author("TOLKIEN").is_err());
    assert!(service.create_author("").is_err());

    assert_eq!(fs::metadata(wal_path(dir.path())).unwrap().len(), len_after_commit);
}

#[test]
fn torn_tail_is_truncated_on_open() {
    let dir = TempDir::new().unwrap();
    open(dir.path()).create_author("Tolkien").unwrap();

    let path = wal_path(dir.path());
    let clean_len = fs::metadata(&path).unwrap().len();
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[0x40, 0x00, 0x00, 0x00, 0x01, 0x03]).unwrap();
    drop(file);

    let service = open(dir.path());
    assert_eq!(fs::metadata(&path).unwrap().len(), clean_len);
    assert_eq!(service.list_authors().unwrap().len(), 1);

    service.create_author("Rowling").unwrap();
    drop(service);
    assert_eq!(open(dir.path()).list_authors().unwrap().len(), 2);
}

#[test]
fn corrupted_record_fails_open() {
    let dir = TempDir::new().unwrap();
    {
        let service = open(dir.path());
        service.create_author("Tolkien").unwrap();
        service.create_author("Rowling").unwrap();
    }

    // Flip a payload byte inside the first record
    let path = wal_path(dir.path());
    let mut bytes = fs::read(&path).unwrap();
    bytes[16] ^= 0xFF;
    fs::write(&path, bytes).unwrap();

    assert!(CatalogStore::open(dir.path()).is_err());
}

#[test]
fn damaged_length_prefix_fails_open_and_keeps_the_log() {
    for (byte, mask) in [(3usize, 0x40u8), (1, 0x01)] {
        let dir = TempDir::new().unwrap();
        {
            let service = open(dir.path());
            for name in ["Tolkien", "Rowling", "Le Guin"] {
                service.create_author(name).unwrap();
            }
        }

        let path = wal_path(dir.path());
        let mut bytes = fs::read(&path).unwrap();
        bytes[byte] ^= mask;
        fs::write(&path, &bytes).unwrap();

        assert!(
            CatalogStore::open(dir.path()).is_err(),
            "open succeeded with byte {} flipped by {:#x}",
            byte,
            mask
        );
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }
}
