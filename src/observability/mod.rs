//! Observability
//!
//! Typed lifecycle and domain events emitted through `tracing`, and the
//! subscriber setup used by the binary.
//!
//! # Usage
//!
//! ```ignore
//! use authors_api::observability::{init_logging, log_event_with_fields, Event};
//!
//! init_logging("info");
//! log_event_with_fields(Event::AuthorCreated, &[("name", "Tolkien")]);
//! ```

mod events;
mod logging;

pub use events::Event;
pub use logging::{init_logging, log_event, log_event_with_fields, render_fields, LOG_LEVELS};
