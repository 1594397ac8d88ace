//! Observable events
//!
//! Every lifecycle and domain event the service reports. Events are
//! typed; their names are stable `SCREAMING_SNAKE` strings so log lines
//! can be grepped and alerted on.

use std::fmt;

use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Process startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Durable store rebuilt from its WAL
    WalReplayed,
    /// HTTP listener bound
    ServerListening,
    /// Shutdown signal received
    ShutdownStart,
    /// Server drained and stopped
    ShutdownComplete,

    // Domain
    /// Author committed
    AuthorCreated,
    /// Book committed
    BookCreated,
    /// Request refused by a domain rule
    RequestRejected,
    /// Persistence failure surfaced to a caller
    StoreFailure,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::WalReplayed => "WAL_REPLAYED",
            Event::ServerListening => "SERVER_LISTENING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::AuthorCreated => "AUTHOR_CREATED",
            Event::BookCreated => "BOOK_CREATED",
            Event::RequestRejected => "REQUEST_REJECTED",
            Event::StoreFailure => "STORE_FAILURE",
        }
    }

    /// Level the event is logged at
    pub fn level(&self) -> Level {
        match self {
            Event::StoreFailure => Level::ERROR,
            Event::RequestRejected => Level::DEBUG,
            _ => Level::INFO,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
