//! Observability subsystem
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed engine events
//! - Per-query execution metrics
//! - Scopes that log the outcome of a unit of work
//!
//! Observability is read-only: it never changes what a cursor returns and
//! logging failures are swallowed.
//!
//! # Usage
//!
//! ```ignore
//! use hkeyexec::observability::{log_event, Event, ObservationScope};
//!
//! log_event(Event::ConfigLoaded, &[("row_count_mode", "exact")]);
//!
//! let scope = ObservationScope::new("QUERY");
//! // ... drain a cursor ...
//! scope.complete(&[("rows", "42")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{ExecutionMetrics, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log an engine event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
