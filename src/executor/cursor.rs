//! The cursor protocol
//!
//! A cursor is the only execution-time interface to an operator:
//! `open`, `next` until end of stream, `close`, and finally `destroy`.
//! See [`CursorLifecycle`](super::CursorLifecycle) for the allowed order.

use crate::row::Row;

use super::bindings::Bindings;
use super::errors::ExecutionResult;
use super::lifecycle::CursorState;

/// A pull-based, stateful row producer.
///
/// `Ok(None)` from `next` is end of stream and leaves the cursor `IDLE`;
/// `Err` is a failure and is never confused with end of stream.
///
/// Cursors are `Send` so a whole tree can be moved to the thread that
/// drives it, but a cursor is never shared between threads.
pub trait Cursor: Send {
    /// Position the cursor using the current binding values. Never yields a row.
    fn open(&mut self, bindings: &Bindings) -> ExecutionResult<()>;

    /// Next row, or `None` at end of stream.
    fn next(&mut self) -> ExecutionResult<Option<Row>>;

    /// Release what `open` acquired. A no-op when already idle.
    fn close(&mut self) -> ExecutionResult<()>;

    /// Release everything; no call is valid afterwards.
    fn destroy(&mut self) -> ExecutionResult<()>;

    /// Current lifecycle state
    fn state(&self) -> CursorState;

    fn is_idle(&self) -> bool {
        self.state() == CursorState::Idle
    }

    fn is_active(&self) -> bool {
        self.state() == CursorState::Active
    }

    fn is_destroyed(&self) -> bool {
        self.state() == CursorState::Destroyed
    }
}

/// A boxed cursor for dynamic dispatch
pub type BoxedCursor = Box<dyn Cursor>;

/// Open `cursor`, drain it, and leave it idle.
///
/// On failure the cursor is closed before the error is returned.
pub fn collect_rows(cursor: &mut dyn Cursor, bindings: &Bindings) -> ExecutionResult<Vec<Row>> {
    cursor.open(bindings)?;
    let mut rows = Vec::new();
    loop {
        match cursor.next() {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => break,
            Err(e) => {
                let _ = cursor.close();
                return Err(e);
            }
        }
    }
    cursor.close()?;
    Ok(rows)
}
