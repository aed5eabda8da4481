//! Cursor execution core
//!
//! # Protocol
//!
//! 1. An operator tree hands out a fresh, idle cursor tree
//! 2. The caller builds `Bindings` sized for the plan
//! 3. `open(bindings)`, then `next()` until `Ok(None)`
//! 4. `close()` (no-op once idle), finally `destroy()`
//!
//! # Invariants
//!
//! - `next` before `open` is a lifecycle error, never end of stream
//! - Every `next` polls the query's cancellation token first
//! - A failure is `Err`, distinct from end of stream, and leaves nothing open

mod bindings;
mod config;
mod context;
mod cursor;
mod errors;
mod lifecycle;

pub use bindings::{BoundValue, Bindings};
pub use config::{ConfigError, ExecutionConfig, RowCountMode};
pub use context::{CancellationToken, QueryContext};
pub use cursor::{collect_rows, BoxedCursor, Cursor};
pub use errors::{ErrorClass, ExecutionError, ExecutionErrorCode, ExecutionResult, Severity};
pub use lifecycle::{CursorLifecycle, CursorState};
