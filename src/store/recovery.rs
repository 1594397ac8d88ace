//! WAL replay for the durable store
//!
//! Rebuilds the catalog from `<data_dir>/wal/wal.log`:
//!
//! 1. Records are read in sequence order
//! 2. Entity records are buffered until their COMMIT marker
//! 3. Each committed batch must pass the catalog constraints
//! 4. Anything after the last COMMIT (a torn record or an unterminated
//!    batch) is cut off so the next append continues a clean log

use std::fs;
use std::path::Path;

use super::catalog::{Catalog, Mutation};
use super::errors::StoreResult;
use crate::wal::{wal_path, WalError, WalErrorCode, WalReader, WalWriter};

/// Outcome of a replay
#[derive(Debug)]
pub struct Recovered {
    pub catalog: Catalog,
    /// Sequence number the writer should assign next
    pub next_sequence: u64,
    /// Number of COMMIT markers applied
    pub committed_batches: u64,
    /// Entity records dropped because their batch never committed
    pub discarded_records: usize,
    /// Bytes cut from the end of the log
    pub truncated_bytes: u64,
}

/// Replay the log under `data_dir`. A missing log yields an empty catalog.
pub fn replay(data_dir: &Path) -> StoreResult<Recovered> {
    let path = wal_path(data_dir);
    let mut recovered = Recovered {
        catalog: Catalog::new(),
        next_sequence: 1,
        committed_batches: 0,
        discarded_records: 0,
        truncated_bytes: 0,
    };

    if !path.exists() {
        return Ok(recovered);
    }

    let file_len = fs::metadata(&path)
        .map_err(|e| WalError::corruption_at_offset(0, format!("Failed to stat WAL: {}", e)))?
        .len();

    let mut reader = WalReader::open(&path)?;
    let mut pending: Vec<Mutation> = Vec::new();
    let mut committed_offset = 0u64;

    loop {
        let record = match reader.read_next() {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(e) if e.code() == WalErrorCode::TornTail => {
                tracing::warn!(error = %e, "WAL ends with a torn record");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        match Mutation::decode(record.record_type, &record.payload)? {
            Some(mutation) => pending.push(mutation),
            None => {
                let batch = std::mem::take(&mut pending);
                recovered.catalog.apply(batch).map_err(|e| {
                    WalError::corruption_at_offset(
                        committed_offset,
                        format!("Committed batch violates store constraints: {}", e),
                    )
                })?;
                committed_offset = reader.current_offset();
                recovered.next_sequence = record.sequence_number + 1;
                recovered.committed_batches += 1;
            }
        }
    }

    recovered.discarded_records = pending.len();
    if file_len > committed_offset {
        recovered.truncated_bytes = file_len - committed_offset;
        tracing::warn!(
            path = %path.display(),
            truncated_bytes = recovered.truncated_bytes,
            discarded_records = recovered.discarded_records,
            "discarding uncommitted WAL tail"
        );
        WalWriter::truncate_tail(&path, committed_offset)?;
    }

    Ok(recovered)
}
