//! WAL error types
//!
//! Error codes:
//! - AUTHORS_WAL_APPEND_FAILED (ERROR severity)
//! - AUTHORS_WAL_FSYNC_FAILED (FATAL severity)
//! - AUTHORS_WAL_CORRUPTION (FATAL severity)
//! - AUTHORS_WAL_TORN_TAIL (ERROR severity, repaired on open)

use std::fmt;
use std::io;

/// Severity of a WAL error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, server continues
    Error,
    /// Server must not continue with this log
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// WAL error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalErrorCode {
    /// Write to the log failed
    AppendFailed,
    /// fsync of the log failed
    FsyncFailed,
    /// Checksum, structure or sequence violation
    Corruption,
    /// The final record was cut short by a crash
    TornTail,
}

impl WalErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            WalErrorCode::AppendFailed => "AUTHORS_WAL_APPEND_FAILED",
            WalErrorCode::FsyncFailed => "AUTHORS_WAL_FSYNC_FAILED",
            WalErrorCode::Corruption => "AUTHORS_WAL_CORRUPTION",
            WalErrorCode::TornTail => "AUTHORS_WAL_TORN_TAIL",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            WalErrorCode::AppendFailed | WalErrorCode::TornTail => Severity::Error,
            WalErrorCode::FsyncFailed | WalErrorCode::Corruption => Severity::Fatal,
        }
    }
}

impl fmt::Display for WalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// WAL error with code, message and optional byte offset
#[derive(Debug)]
pub struct WalError {
    code: WalErrorCode,
    message: String,
    offset: Option<u64>,
    source: Option<io::Error>,
}

impl WalError {
    pub fn append_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: WalErrorCode::AppendFailed,
            message: message.into(),
            offset: None,
            source: Some(source),
        }
    }

    pub fn fsync_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: WalErrorCode::FsyncFailed,
            message: message.into(),
            offset: None,
            source: Some(source),
        }
    }

    pub fn corruption_at_offset(offset: u64, message: impl Into<String>) -> Self {
        Self {
            code: WalErrorCode::Corruption,
            message: message.into(),
            offset: Some(offset),
            source: None,
        }
    }

    pub fn torn_tail_at_offset(offset: u64, message: impl Into<String>) -> Self {
        Self {
            code: WalErrorCode::TornTail,
            message: message.into(),
            offset: Some(offset),
            source: None,
        }
    }

    pub fn code(&self) -> WalErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset of the offending record, if known
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for WalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " (byte_offset: {})", offset)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for WalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for WAL operations
pub type WalResult<T> = Result<T, WalError>;
