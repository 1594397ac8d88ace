//! WAL writer
//!
//! A commit is written as its entity records followed by a COMMIT marker,
//! in a single write, then fsynced. A commit is acknowledged only after
//! fsync returns.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::errors::{WalError, WalResult};
use super::record::{RecordType, WalRecord, MAX_RECORD_LEN};

/// Location of the log inside a data directory
pub fn wal_path(data_dir: &Path) -> PathBuf {
    data_dir.join("wal").join("wal.log")
}

/// Append-only WAL writer
pub struct WalWriter {
    wal_path: PathBuf,
    file: File,
    /// Length of the file up to the last acknowledged commit
    committed_len: u64,
    /// Next sequence number to assign (starts at 1, never reused)
    next_sequence: u64,
}

impl WalWriter {
    /// Opens or creates `<data_dir>/wal/wal.log` for appending.
    ///
    /// `next_sequence` must come from replaying the existing log.
    pub fn open(data_dir: &Path, next_sequence: u64) -> WalResult<Self> {
        let wal_path = wal_path(data_dir);
        let wal_dir = wal_path.parent().unwrap_or(data_dir);

        if !wal_dir.exists() {
            fs::create_dir_all(wal_dir).map_err(|e| {
                WalError::append_failed(
                    format!("Failed to create WAL directory: {}", wal_dir.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&wal_path)
            .map_err(|e| {
                WalError::append_failed(format!("Failed to open WAL file: {}", wal_path.display()), e)
            })?;

        let committed_len = file
            .metadata()
            .map_err(|e| WalError::append_failed("Failed to read WAL metadata", e))?
            .len();

        Ok(Self {
            wal_path,
            file,
            committed_len,
            next_sequence: next_sequence.max(1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.wal_path
    }

    pub fn next_sequence_number(&self) -> u64 {
        self.next_sequence
    }

    /// Append `entries` plus a COMMIT marker and fsync.
    ///
    /// Returns the sequence number of the COMMIT marker. On failure the
    /// file is cut back to its last committed length and no sequence
    /// numbers are consumed.
    pub fn append_commit(&mut self, entries: &[(RecordType, Vec<u8>)]) -> WalResult<u64> {
        let mut sequence = self.next_sequence;
        let mut buf = Vec::new();

        for (record_type, payload) in entries {
            let record = WalRecord::new(*record_type, sequence, payload.clone());
            if record.encoded_len() > MAX_RECORD_LEN {
                return Err(WalError::append_failed(
                    format!("WAL record at sequence {} is too large", sequence),
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("{} bytes exceeds {}", record.encoded_len(), MAX_RECORD_LEN),
                    ),
                ));
            }
            buf.extend_from_slice(&record.serialize());
            sequence += 1;
        }
        let commit_sequence = sequence;
        buf.extend_from_slice(&WalRecord::commit(commit_sequence).serialize());

        if let Err(e) = self.file.write_all(&buf) {
            self.rollback_partial_write();
            return Err(WalError::append_failed(
                format!("Failed to write WAL commit at sequence {}", commit_sequence),
                e,
            ));
        }

        if let Err(e) = self.file.sync_all() {
            self.rollback_partial_write();
            return Err(WalError::fsync_failed(
                format!("fsync failed after WAL commit at sequence {}", commit_sequence),
                e,
            ));
        }

        self.committed_len += buf.len() as u64;
        self.next_sequence = commit_sequence + 1;

        Ok(commit_sequence)
    }

    fn rollback_partial_write(&mut self) {
        if let Err(e) = self.file.set_len(self.committed_len) {
            tracing::error!(
                path = %self.wal_path.display(),
                error = %e,
                "failed to cut WAL back after partial write"
            );
        }
    }

    /// Cut the log at `path` down to `valid_len` bytes and fsync it.
    ///
    /// Used to drop a torn tail found during replay.
    pub fn truncate_tail(path: &Path, valid_len: u64) -> WalResult<()> {
        let file = OpenOptions::new().write(true).open(path).map_err(|e| {
            WalError::append_failed(format!("Failed to open WAL for repair: {}", path.display()), e)
        })?;

        file.set_len(valid_len).map_err(|e| {
            WalError::append_failed(format!("Failed to truncate WAL to {} bytes", valid_len), e)
        })?;

        file.sync_all()
            .map_err(|e| WalError::fsync_failed("fsync failed after WAL repair", e))
    }
}
