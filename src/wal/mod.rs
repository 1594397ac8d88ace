//! Write-ahead log
//!
//! The durable store's source of truth. A commit is acknowledged only
//! after its records and COMMIT marker are fsynced.
//!
//! # Rules
//!
//! - Every record carries a CRC32 checksum
//! - Sequence numbers start at 1 and increase by exactly 1
//! - Replay applies only batches terminated by a COMMIT marker
//! - A cut-off final record is a torn tail and is repaired on open
//! - Any other defect halts the open

mod checksum;
mod errors;
mod reader;
mod record;
mod writer;

pub use errors::{Severity, WalError, WalErrorCode, WalResult};
pub use reader::WalReader;
pub use record::{RecordType, WalRecord, MAX_RECORD_LEN, RECORD_OVERHEAD};
pub use writer::{wal_path, WalWriter};
