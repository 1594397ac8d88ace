//! WAL record layout
//!
//! Each record on disk:
//! - Record Length (u32 LE), covering the whole record
//! - Record Type (u8): AUTHOR / BOOK / COMMIT
//! - Sequence Number (u64 LE)
//! - Payload (variable, JSON-encoded entity; empty for COMMIT)
//! - Checksum (u32 LE), CRC32 over every preceding byte

use std::io;

use super::checksum::{compute_checksum, verify_checksum};

/// Fixed bytes around the payload: length + type + sequence + checksum
pub const RECORD_OVERHEAD: usize = 4 + 1 + 8 + 4;

/// Largest record the writer will produce. A length prefix above this is
/// never a torn write.
pub const MAX_RECORD_LEN: usize = 16 * 1024 * 1024;

/// Kind of entry in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// Insertion of an author
    Author = 1,
    /// Insertion of a book
    Book = 2,
    /// Terminates a batch; everything since the previous COMMIT becomes visible
    Commit = 3,
}

impl RecordType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(RecordType::Author),
            2 => Some(RecordType::Book),
            3 => Some(RecordType::Commit),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A single WAL record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    pub record_type: RecordType,
    pub sequence_number: u64,
    pub payload: Vec<u8>,
}

impl WalRecord {
    pub fn new(record_type: RecordType, sequence_number: u64, payload: Vec<u8>) -> Self {
        Self {
            record_type,
            sequence_number,
            payload,
        }
    }

    /// COMMIT marker for the given sequence number
    pub fn commit(sequence_number: u64) -> Self {
        Self::new(RecordType::Commit, sequence_number, Vec::new())
    }

    /// Total on-disk size of this record
    pub fn encoded_len(&self) -> usize {
        RECORD_OVERHEAD + self.payload.len()
    }

    /// Serialize to the on-disk layout
    pub fn serialize(&self) -> Vec<u8> {
        let total = self.encoded_len();
        let mut buf = Vec::with_capacity(total);

        buf.extend_from_slice(&(total as u32).to_le_bytes());
        buf.push(self.record_type.as_u8());
        buf.extend_from_slice(&self.sequence_number.to_le_bytes());
        buf.extend_from_slice(&self.payload);

        let checksum = compute_checksum(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }

    /// Parse one complete record from `data`.
    ///
    /// `data` must hold exactly the bytes announced by the length prefix.
    pub fn deserialize(data: &[u8]) -> io::Result<Self> {
        if data.len() < RECORD_OVERHEAD {
            return Err(invalid_data(format!(
                "record too short: {} bytes, minimum {}",
                data.len(),
                RECORD_OVERHEAD
            )));
        }

        let declared = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if declared != data.len() {
            return Err(invalid_data(format!(
                "length prefix {} does not match record size {}",
                declared,
                data.len()
            )));
        }

        let body_end = data.len() - 4;
        let stored_checksum = u32::from_le_bytes([
            data[body_end],
            data[body_end + 1],
            data[body_end + 2],
            data[body_end + 3],
        ]);
        if !verify_checksum(&data[..body_end], stored_checksum) {
            return Err(invalid_data("checksum mismatch"));
        }

        let record_type = RecordType::from_u8(data[4])
            .ok_or_else(|| invalid_data(format!("unknown record type {}", data[4])))?;

        let mut seq = [0u8; 8];
        seq.copy_from_slice(&data[5..13]);
        let sequence_number = u64::from_le_bytes(seq);

        Ok(Self {
            record_type,
            sequence_number,
            payload: data[13..body_end].to_vec(),
        })
    }
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}
