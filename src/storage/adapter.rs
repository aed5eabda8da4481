//! Store adapter interface
//!
//! The execution layer reaches storage only through these two traits. An
//! adapter hands out group cursors and answers row-count questions; it is
//! shared by every cursor of a query and must be thread-safe.

use crate::executor::{Cursor, ExecutionResult};
use crate::row::{GroupTable, HKey, RowType};

/// Storage cursor over every row of one group table, in hkey order.
///
/// Unbound, a group cursor scans the whole group. After `rebind` it scans
/// from the bound hkey: with `deep`, the row at that hkey (if any) and all
/// its descendants; without, only the row at that hkey.
pub trait GroupCursor: Cursor {
    /// Position for the next `open`. Only valid while idle.
    fn rebind(&mut self, hkey: HKey, deep: bool) -> ExecutionResult<()>;
}

/// Boxed group cursor for dynamic dispatch
pub type BoxedGroupCursor = Box<dyn GroupCursor>;

/// Storage services required by the operators
pub trait StoreAdapter: Send + Sync {
    /// Fresh, idle, unbound cursor over `group`
    fn new_group_cursor(&self, group: &GroupTable) -> ExecutionResult<BoxedGroupCursor>;

    /// Row count of the table behind `row_type`.
    ///
    /// Exact or approximate depending on how the adapter is configured.
    fn row_count(&self, row_type: &RowType) -> ExecutionResult<i64>;
}
