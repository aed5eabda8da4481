//! Physical operators
//!
//! An operator is an immutable plan node. It validates its arguments when
//! constructed and afterwards only hands out cursors: each call to
//! [`Operator::cursor`] returns a fresh, idle cursor tree owning its own
//! execution state. Child operators are shared through `Arc`.
//!
//! # Operators
//!
//! - [`GroupScan`]: full or positional (deep / shallow) scan of a group table
//! - [`Count`]: one row holding a table's maintained row count
//! - [`NestedLoopMap`]: binds each outer row's hkey and drives an inner plan

mod count;
mod group_scan;
mod limit;
mod nested_loop;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashSet;
use std::sync::Arc;

use crate::executor::{BoxedCursor, ExecutionResult, QueryContext};
use crate::row::RowType;
use crate::storage::StoreAdapter;

pub use count::Count;
pub use group_scan::GroupScan;
pub use limit::{Limit, LimitState};
pub use nested_loop::NestedLoopMap;

/// An immutable physical plan node
pub trait Operator: Send + Sync {
    /// Fresh, idle cursor bound to `adapter` and `context`
    fn cursor(&self, adapter: &Arc<dyn StoreAdapter>, context: &QueryContext) -> ExecutionResult<BoxedCursor>;

    /// Type of every row this operator's cursors produce
    fn row_type(&self) -> Arc<RowType>;

    /// Add every row type introduced by this operator or its descendants
    fn find_derived_types(&self, types: &mut HashSet<Arc<RowType>>);

    /// Short operator name used in error context
    fn name(&self) -> &'static str;

    /// One-line rendition including children
    fn describe(&self) -> String;

    /// One past the highest binding slot read or written by this subtree
    fn binding_slots(&self) -> usize {
        0
    }
}

/// Shared handle to an operator
pub type OperatorRef = Arc<dyn Operator>;

/// Every row type derived anywhere in `plan`
pub fn derived_types(plan: &dyn Operator) -> HashSet<Arc<RowType>> {
    let mut types = HashSet::new();
    plan.find_derived_types(&mut types);
    types
}
