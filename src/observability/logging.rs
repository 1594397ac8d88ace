//! Logging setup and event emission through `tracing`

use tracing::Level;
use tracing_subscriber::EnvFilter;

use super::events::Event;

/// Accepted values for the `log_level` setting
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Calling this more than once
/// is harmless; later calls are ignored.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Render fields as `key=value` pairs, sorted by key
pub fn render_fields(fields: &[(&str, &str)]) -> String {
    let mut sorted: Vec<_> = fields.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);
    sorted
        .iter()
        .map(|(k, v)| format!("{}={:?}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Log an event with no extra fields
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log an event at its own level
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let name = event.as_str();
    let rendered = render_fields(fields);

    let level = event.level();
    if level == Level::ERROR {
        tracing::error!(event = name, "{}", rendered);
    } else if level == Level::WARN {
        tracing::warn!(event = name, "{}", rendered);
    } else if level == Level::INFO {
        tracing::info!(event = name, "{}", rendered);
    } else if level == Level::DEBUG {
        tracing::debug!(event = name, "{}", rendered);
    } else {
        tracing::trace!(event = name, "{}", rendered);
    }
}
