//! Sequential WAL reader
//!
//! Records are read strictly in order. Only the last record in the file can
//! be a torn tail: one cut short or failing its checksum, with no intact
//! record after it. Every other defect (bad checksum, oversized length,
//! sequence gap) is corruption.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::errors::{WalError, WalResult};
use super::record::{WalRecord, MAX_RECORD_LEN, RECORD_OVERHEAD};

/// WAL reader for replay
pub struct WalReader {
    reader: BufReader<File>,
    /// Byte offset of the next unread record
    current_offset: u64,
    file_size: u64,
    last_sequence: u64,
}

impl WalReader {
    /// Open the log at `wal_path`.
    pub fn open(wal_path: &Path) -> WalResult<Self> {
        let file = File::open(wal_path).map_err(|e| {
            WalError::corruption_at_offset(
                0,
                format!("Failed to open WAL file {}: {}", wal_path.display(), e),
            )
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| WalError::corruption_at_offset(0, format!("Failed to read WAL metadata: {}", e)))?
            .len();

        Ok(Self {
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
            last_sequence: 0,
        })
    }

    /// Offset just past the last record returned
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    pub fn last_sequence_number(&self) -> u64 {
        self.last_sequence
    }

    /// Read the next record.
    ///
    /// - `Ok(Some(record))` for a valid record
    /// - `Ok(None)` at a clean end of file
    /// - `Err` with `TORN_TAIL` if the final record is incomplete
    /// - `Err` with `CORRUPTION` for anything else
    pub fn read_next(&mut self) -> WalResult<Option<WalRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < 4 {
            return Err(WalError::torn_tail_at_offset(
                self.current_offset,
                format!("{} trailing bytes cannot hold a length prefix", remaining),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.read_exact(&mut len_buf)?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < RECORD_OVERHEAD as u64 {
            return Err(WalError::corruption_at_offset(
                self.current_offset,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if record_length > MAX_RECORD_LEN as u64 {
            return Err(WalError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Record length {} exceeds the maximum of {}",
                    record_length, MAX_RECORD_LEN
                ),
            ));
        }

        if record_length >= remaining {
            return self.read_final_record(len_buf, record_length, remaining);
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[..4].copy_from_slice(&len_buf);
        self.read_exact(&mut record_buf[4..])?;

        let record = WalRecord::deserialize(&record_buf)
            .map_err(|e| WalError::corruption_at_offset(self.current_offset, e.to_string()))?;

        self.accept(record, record_length)
    }

    /// Read a record whose declared end reaches or passes the end of file.
    ///
    /// It is a torn tail only if it is incomplete or fails its checksum and
    /// no intact later record hides in the remaining bytes. Otherwise the
    /// length prefix itself is damaged and the log is corrupt.
    fn read_final_record(
        &mut self,
        len_buf: [u8; 4],
        record_length: u64,
        remaining: u64,
    ) -> WalResult<Option<WalRecord>> {
        let mut tail = vec![0u8; remaining as usize];
        tail[..4].copy_from_slice(&len_buf);
        self.read_exact(&mut tail[4..])?;

        let parse_error = if record_length == remaining {
            match WalRecord::deserialize(&tail) {
                Ok(record) => return self.accept(record, record_length),
                Err(e) => e.to_string(),
            }
        } else {
            format!(
                "Record length {} exceeds remaining file size {}",
                record_length, remaining
            )
        };

        if let Some(at) = intact_record_after(&tail, self.last_sequence) {
            return Err(WalError::corruption_at_offset(
                self.current_offset,
                format!(
                    "{}; an intact record follows at offset {}",
                    parse_error,
                    self.current_offset + at as u64
                ),
            ));
        }

        Err(WalError::torn_tail_at_offset(self.current_offset, parse_error))
    }

    fn accept(&mut self, record: WalRecord, record_length: u64) -> WalResult<Option<WalRecord>> {
        if record.sequence_number != self.last_sequence + 1 {
            return Err(WalError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Non-sequential sequence number: expected {}, got {}",
                    self.last_sequence + 1,
                    record.sequence_number
                ),
            ));
        }

        self.current_offset += record_length;
        self.last_sequence = record.sequence_number;

        Ok(Some(record))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> WalResult<()> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                WalError::torn_tail_at_offset(self.current_offset, "Unexpected end of WAL")
            } else {
                WalError::corruption_at_offset(self.current_offset, format!("Read failed: {}", e))
            }
        })
    }
}

/// Position of the first complete, checksummed record in `bytes` past
/// offset 0 whose sequence number lies after `last_sequence`.
fn intact_record_after(bytes: &[u8], last_sequence: u64) -> Option<usize> {
    let max_sequence = last_sequence + (bytes.len() / RECORD_OVERHEAD) as u64 + 1;

    (1..bytes.len().saturating_sub(RECORD_OVERHEAD - 1)).find(|&at| {
        let rest = &bytes[at..];
        let len = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        if len < RECORD_OVERHEAD || len > rest.len() {
            return false;
        }
        let mut seq = [0u8; 8];
        seq.copy_from_slice(&rest[5..13]);
        let seq = u64::from_le_bytes(seq);
        seq > last_sequence && seq <= max_sequence && WalRecord::deserialize(&rest[..len]).is_ok()
    })
}

impl Iterator for WalReader {
    type Item = WalResult<WalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::record::RecordType;
    use crate::wal::WalErrorCode;
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_records(path: &Path, records: &[WalRecord]) {
        let mut file = OpenOptions::new().create(true).append(true).open(path).unwrap();
        for record in records {
            file.write_all(&record.serialize()).unwrap();
        }
    }

    #[test]
    fn test_reads_records_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        write_records(
            &path,
            &[
                WalRecord::new(RecordType::Author, 1, b"{}".to_vec()),
                WalRecord::commit(2),
            ],
        );

        let mut reader = WalReader::open(&path).unwrap();
        assert_eq!(reader.read_next().unwrap().unwrap().record_type, RecordType::Author);
        assert_eq!(reader.read_next().unwrap().unwrap().record_type, RecordType::Commit);
        assert!(reader.read_next().unwrap().is_none());
        assert_eq!(reader.last_sequence_number(), 2);
        assert_eq!(reader.current_offset(), fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_truncated_final_record_is_torn_tail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        write_records(&path, &[WalRecord::commit(1)]);

        let partial = WalRecord::new(RecordType::Author, 2, b"{\"name\":\"x\"}".to_vec()).serialize();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&partial[..partial.len() - 3]).unwrap();

        let mut reader = WalReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_some());
        let good_end = reader.current_offset();

        let err = reader.read_next().unwrap_err();
        assert_eq!(err.code(), WalErrorCode::TornTail);
        assert_eq!(err.offset(), Some(good_end));
    }

    #[test]
    fn test_bad_checksum_on_final_record_is_torn_tail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        write_records(&path, &[WalRecord::commit(1)]);

        let mut last = WalRecord::new(RecordType::Author, 2, b"{\"name\":\"x\"}".to_vec()).serialize();
        let end = last.len() - 1;
        last[end] ^= 0xFF;
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&last).unwrap();

        let mut reader = WalReader::open(&path).unwrap();
        reader.read_next().unwrap();
        assert_eq!(reader.read_next().unwrap_err().code(), WalErrorCode::TornTail);
    }

    #[test]
    fn test_overlong_length_before_intact_records_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        write_records(
            &path,
            &[
                WalRecord::new(RecordType::Author, 1, b"{\"name\":\"a\"}".to_vec()),
                WalRecord::commit(2),
                WalRecord::new(RecordType::Author, 3, b"{\"name\":\"b\"}".to_vec()),
                WalRecord::commit(4),
            ],
        );

        // First length prefix now points past the end of the file
        let mut bytes = fs::read(&path).unwrap();
        bytes[1] ^= 0x01;
        fs::write(&path, &bytes).unwrap();

        let err = WalReader::open(&path).unwrap().read_next().unwrap_err();
        assert_eq!(err.code(), WalErrorCode::Corruption);
        assert_eq!(err.offset(), Some(0));
    }

    #[test]
    fn test_length_above_maximum_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        write_records(&path, &[WalRecord::commit(1)]);

        let mut bytes = fs::read(&path).unwrap();
        bytes[3] ^= 0x40;
        fs::write(&path, &bytes).unwrap();

        let err = WalReader::open(&path).unwrap().read_next().unwrap_err();
        assert_eq!(err.code(), WalErrorCode::Corruption);
    }

    #[test]
    fn test_sequence_gap_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        write_records(&path, &[WalRecord::commit(1), WalRecord::commit(3)]);

        let mut reader = WalReader::open(&path).unwrap();
        reader.read_next().unwrap();
        let err = reader.read_next().unwrap_err();
        assert_eq!(err.code(), WalErrorCode::Corruption);
        assert!(err.is_fatal());
    }
}
