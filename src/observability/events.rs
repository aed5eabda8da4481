//! Observable engine events
//!
//! Events are explicit and typed. Per-row cursor events are TRACE and only
//! emitted when operator execution logging is enabled.

use std::fmt;

use super::logger::Severity;

/// Observable events in the execution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Execution configuration loaded
    ConfigLoaded,
    /// Schema and rows loaded into the in-memory adapter
    FixtureLoaded,

    // Cursor lifecycle
    /// Cursor opened
    CursorOpen,
    /// Cursor produced a row
    RowYield,
    /// Cursor reached end of stream
    EndOfStream,
    /// Cursor dropped a row because its limit was reached
    LimitReached,
    /// Cursor closed
    CursorClose,
    /// Cursor destroyed
    CursorDestroy,
    /// `next` refused because the query was canceled
    QueryCanceled,

    // Table status
    /// Stored table status registered
    TableStatusCreated,
    /// Memory table status registered
    MemoryTableStatusCreated,
    /// Table status cleared (truncate / drop)
    TableStatusCleared,
    /// Memory table statuses detached from the schema
    SchemaDetached,

    // Sessions
    /// Buffered row-count changes applied
    SessionCommit,
    /// Buffered row-count changes discarded
    SessionRollback,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::FixtureLoaded => "FIXTURE_LOADED",

            Event::CursorOpen => "CURSOR_OPEN",
            Event::RowYield => "ROW_YIELD",
            Event::EndOfStream => "END_OF_STREAM",
            Event::LimitReached => "LIMIT_REACHED",
            Event::CursorClose => "CURSOR_CLOSE",
            Event::CursorDestroy => "CURSOR_DESTROY",
            Event::QueryCanceled => "QUERY_CANCELED",

            Event::TableStatusCreated => "TABLE_STATUS_CREATED",
            Event::MemoryTableStatusCreated => "MEMORY_TABLE_STATUS_CREATED",
            Event::TableStatusCleared => "TABLE_STATUS_CLEARED",
            Event::SchemaDetached => "SCHEMA_DETACHED",

            Event::SessionCommit => "SESSION_COMMIT",
            Event::SessionRollback => "SESSION_ROLLBACK",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::CursorOpen
            | Event::RowYield
            | Event::EndOfStream
            | Event::LimitReached
            | Event::CursorClose
            | Event::CursorDestroy => Severity::Trace,
            Event::QueryCanceled => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
