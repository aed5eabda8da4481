//! Nested-loop map
//!
//! For every outer row, writes the row's hkey into a binding slot and
//! drains the inner plan with those bindings. Typically the inner plan is
//! a positional `GroupScan` reading that slot, giving a correlated
//! ancestor/descendant walk.
//!
//! The cursor works on a private copy of the bindings taken at `open`, so
//! the slot it writes is never visible to the caller.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::executor::{
    Bindings, BoxedCursor, Cursor, CursorLifecycle, CursorState, ExecutionError, ExecutionResult,
    QueryContext,
};
use crate::observability::Event;
use crate::row::{Row, RowType, RowTypeKind};
use crate::storage::StoreAdapter;

use super::{Operator, OperatorRef};

const NAME: &str = "NestedLoopMap";

/// Correlated nested loop over two plans
#[derive(Clone)]
pub struct NestedLoopMap {
    outer: OperatorRef,
    inner: OperatorRef,
    slot: usize,
}

impl NestedLoopMap {
    /// Fails unless `outer` produces rows that carry an hkey
    pub fn new(outer: OperatorRef, inner: OperatorRef, slot: usize) -> ExecutionResult<Self> {
        let outer_type = outer.row_type();
        if matches!(outer_type.kind(), RowTypeKind::Values) {
            return Err(ExecutionError::invalid_argument(
                NAME,
                format!("outer produces {}, which has no hkey to bind", outer_type),
            ));
        }
        Ok(Self { outer, inner, slot })
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl fmt::Debug for NestedLoopMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Operator for NestedLoopMap {
    fn cursor(&self, adapter: &Arc<dyn StoreAdapter>, context: &QueryContext) -> ExecutionResult<BoxedCursor> {
        let outer = self.outer.cursor(adapter, context)?;
        let inner = self.inner.cursor(adapter, context)?;
        Ok(Box::new(NestedLoopCursor {
            lifecycle: CursorLifecycle::new(NAME),
            context: context.clone(),
            outer,
            inner,
            slot: self.slot,
            bindings: Bindings::default(),
        }))
    }

    fn row_type(&self) -> Arc<RowType> {
        self.inner.row_type()
    }

    fn find_derived_types(&self, types: &mut HashSet<Arc<RowType>>) {
        self.outer.find_derived_types(types);
        self.inner.find_derived_types(types);
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> String {
        format!(
            "{}(${}, {}, {})",
            NAME,
            self.slot,
            self.outer.describe(),
            self.inner.describe()
        )
    }

    fn binding_slots(&self) -> usize {
        (self.slot + 1)
            .max(self.outer.binding_slots())
            .max(self.inner.binding_slots())
    }
}

struct NestedLoopCursor {
    lifecycle: CursorLifecycle,
    context: QueryContext,
    outer: BoxedCursor,
    inner: BoxedCursor,
    slot: usize,
    bindings: Bindings,
}

impl NestedLoopCursor {
    /// Close both children after a failure; the first error wins
    fn abort(&mut self, err: ExecutionError) -> ExecutionError {
        if self.inner.is_active() {
            let _ = self.inner.close();
        }
        if self.outer.is_active() {
            let _ = self.outer.close();
        }
        self.lifecycle.deactivate();
        err.with_operator(NAME)
    }

    fn start_inner(&mut self, outer_row: &Row) -> ExecutionResult<()> {
        let hkey = outer_row.hkey().cloned().ok_or_else(|| {
            ExecutionError::invalid_argument(NAME, format!("outer row {} has no hkey", outer_row))
        })?;
        self.bindings.set(self.slot, hkey)?;
        self.inner.open(&self.bindings)
    }
}

impl Cursor for NestedLoopCursor {
    fn open(&mut self, bindings: &Bindings) -> ExecutionResult<()> {
        self.lifecycle.check_idle()?;
        if self.slot >= bindings.reserved() {
            return Err(
                ExecutionError::binding_out_of_range(self.slot, bindings.reserved()).with_operator(NAME),
            );
        }
        self.bindings = bindings.clone();
        self.outer.open(&self.bindings)?;
        self.lifecycle.activate();
        self.context.metrics().increment_cursors_opened();
        self.context.trace(Event::CursorOpen, NAME, &format!("${}", self.slot));
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        self.lifecycle.check_active()?;
        if let Err(e) = self.context.check_cancellation() {
            return Err(self.abort(e));
        }
        loop {
            if self.inner.is_active() {
                match self.inner.next() {
                    Ok(Some(row)) => return Ok(Some(row)),
                    Ok(None) => {}
                    Err(e) => return Err(self.abort(e)),
                }
            }
            match self.outer.next() {
                Ok(Some(outer_row)) => {
                    if let Err(e) = self.start_inner(&outer_row) {
                        return Err(self.abort(e));
                    }
                }
                Ok(None) => {
                    self.lifecycle.deactivate();
                    self.context.trace(Event::EndOfStream, NAME, &format!("${}", self.slot));
                    return Ok(None);
                }
                Err(e) => return Err(self.abort(e)),
            }
        }
    }

    fn close(&mut self) -> ExecutionResult<()> {
        self.lifecycle.check_idle_or_active()?;
        if !self.lifecycle.is_active() {
            return Ok(());
        }
        let inner = if self.inner.is_active() {
            self.inner.close()
        } else {
            Ok(())
        };
        let outer = self.outer.close();
        self.lifecycle.deactivate();
        self.context.trace(Event::CursorClose, NAME, &format!("${}", self.slot));
        inner.and(outer)
    }

    fn destroy(&mut self) -> ExecutionResult<()> {
        self.lifecycle.destroy()?;
        let inner = self.inner.destroy();
        let outer = self.outer.destroy();
        self.context.metrics().increment_cursors_destroyed();
        self.context.trace(Event::CursorDestroy, NAME, &format!("${}", self.slot));
        inner.and(outer)
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}
