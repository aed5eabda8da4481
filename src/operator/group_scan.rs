//! Group scan
//!
//! Walks a group table in hkey order. A full scan visits every row. A
//! positional scan reads an hkey from a binding slot at `open` and visits
//! either the row at that hkey (shallow) or that row and all its
//! descendants (deep). Because descendants are contiguous in hkey order, a
//! deep scan stops at the first row outside the bound subtree.
//!
//! Rows are owned copies; callers may keep them.

use std::collections::HashSet;
use std::sync::Arc;

use crate::executor::{
    Bindings, BoxedCursor, Cursor, CursorLifecycle, CursorState, ExecutionError, ExecutionResult,
    QueryContext,
};
use crate::observability::Event;
use crate::row::{GroupTable, HKey, Row, RowType};
use crate::storage::{BoxedGroupCursor, StoreAdapter};

use super::limit::{Limit, LimitState};
use super::Operator;

const NAME: &str = "GroupScan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    Full,
    Positional { slot: usize, deep: bool },
}

/// Scan of one group table
#[derive(Debug, Clone)]
pub struct GroupScan {
    group: GroupTable,
    mode: ScanMode,
    limit: Arc<Limit>,
}

impl GroupScan {
    /// Every row of `group`
    pub fn full(group: GroupTable) -> Self {
        Self {
            group,
            mode: ScanMode::Full,
            limit: Arc::new(Limit::NoLimit),
        }
    }

    /// Rows at (and with `deep`, below) the hkey bound in `slot`
    pub fn positional(group: GroupTable, slot: usize, deep: bool) -> Self {
        Self {
            group,
            mode: ScanMode::Positional { slot, deep },
            limit: Arc::new(Limit::NoLimit),
        }
    }

    pub fn with_limit(mut self, limit: Limit) -> Self {
        self.limit = Arc::new(limit);
        self
    }

    pub fn group(&self) -> &GroupTable {
        &self.group
    }

    pub fn limit(&self) -> &Limit {
        &self.limit
    }
}

impl Operator for GroupScan {
    fn cursor(&self, adapter: &Arc<dyn StoreAdapter>, context: &QueryContext) -> ExecutionResult<BoxedCursor> {
        let inner = adapter
            .new_group_cursor(&self.group)
            .map_err(|e| e.with_operator(NAME))?;
        Ok(Box::new(GroupScanCursor {
            lifecycle: CursorLifecycle::new(NAME),
            context: context.clone(),
            inner,
            mode: self.mode,
            limit: Arc::clone(&self.limit),
            limit_state: LimitState::new(),
            bound: None,
        }))
    }

    fn row_type(&self) -> Arc<RowType> {
        Arc::clone(self.group.row_type())
    }

    fn find_derived_types(&self, _types: &mut HashSet<Arc<RowType>>) {}

    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> String {
        let scan = match self.mode {
            ScanMode::Full => "full".to_string(),
            ScanMode::Positional { slot, deep: true } => format!("deep ${}", slot),
            ScanMode::Positional { slot, deep: false } => format!("shallow ${}", slot),
        };
        if self.limit.is_unlimited() {
            format!("{}({}, {})", NAME, self.group.name(), scan)
        } else {
            format!("{}({}, {}, {})", NAME, self.group.name(), scan, self.limit)
        }
    }

    fn binding_slots(&self) -> usize {
        match self.mode {
            ScanMode::Full => 0,
            ScanMode::Positional { slot, .. } => slot + 1,
        }
    }
}

struct GroupScanCursor {
    lifecycle: CursorLifecycle,
    context: QueryContext,
    inner: BoxedGroupCursor,
    mode: ScanMode,
    limit: Arc<Limit>,
    limit_state: LimitState,
    /// Hkey read from the binding slot at the last `open`
    bound: Option<(HKey, bool)>,
}

impl GroupScanCursor {
    fn in_range(&self, row: &Row) -> bool {
        match (&self.bound, row.hkey()) {
            (None, _) => true,
            (Some((start, true)), Some(hkey)) => start.is_prefix_of(hkey),
            (Some((start, false)), Some(hkey)) => start == hkey,
            (Some(_), None) => false,
        }
    }

    /// Stop the scan; the cursor is left idle
    fn finish(&mut self, event: Event) -> ExecutionResult<Option<Row>> {
        let closed = self.release();
        self.context.trace(event, NAME, &self.group_detail());
        closed.map(|()| None)
    }

    /// Close the storage cursor if open and return to IDLE, even when the
    /// close fails
    fn release(&mut self) -> ExecutionResult<()> {
        let closed = if self.inner.is_active() {
            self.inner.close().map_err(|e| e.with_operator(NAME))
        } else {
            Ok(())
        };
        self.lifecycle.deactivate();
        closed
    }

    /// Release the storage cursor after a failure in `next`
    fn abort(&mut self, err: ExecutionError) -> ExecutionError {
        let _ = self.inner.close();
        self.lifecycle.deactivate();
        err.with_operator(NAME)
    }

    fn group_detail(&self) -> String {
        match &self.bound {
            Some((hkey, _)) => hkey.to_string(),
            None => "full".to_string(),
        }
    }
}

impl Cursor for GroupScanCursor {
    fn open(&mut self, bindings: &Bindings) -> ExecutionResult<()> {
        self.lifecycle.check_idle()?;
        if let ScanMode::Positional { slot, deep } = self.mode {
            let hkey = bindings
                .get_hkey(slot)
                .map_err(|e| e.with_operator(NAME))?
                .clone();
            self.inner
                .rebind(hkey.clone(), deep)
                .map_err(|e| e.with_operator(NAME))?;
            self.context.metrics().increment_rebinds();
            self.bound = Some((hkey, deep));
        }
        self.inner.open(bindings).map_err(|e| e.with_operator(NAME))?;
        self.limit_state.reset();
        self.lifecycle.activate();
        self.context.metrics().increment_cursors_opened();
        self.context.trace(Event::CursorOpen, NAME, &self.group_detail());
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        self.lifecycle.check_active()?;
        if let Err(e) = self.context.check_cancellation() {
            return Err(self.abort(e));
        }
        let row = match self.inner.next() {
            Ok(Some(row)) => row,
            Ok(None) => return self.finish(Event::EndOfStream),
            Err(e) => return Err(self.abort(e)),
        };
        if !self.in_range(&row) {
            return self.finish(Event::EndOfStream);
        }
        if self.limit_state.reached(&self.limit, &row) {
            self.context.metrics().increment_limits_reached();
            return self.finish(Event::LimitReached);
        }
        self.context.metrics().increment_rows_produced();
        if self.context.config().log_operator_execution {
            self.context.trace(Event::RowYield, NAME, &row.to_string());
        }
        Ok(Some(row))
    }

    fn close(&mut self) -> ExecutionResult<()> {
        self.lifecycle.check_idle_or_active()?;
        if !self.lifecycle.is_active() {
            return Ok(());
        }
        let closed = self.release();
        self.context.trace(Event::CursorClose, NAME, &self.group_detail());
        closed
    }

    fn destroy(&mut self) -> ExecutionResult<()> {
        self.lifecycle.destroy()?;
        self.bound = None;
        self.context.metrics().increment_cursors_destroyed();
        self.context.trace(Event::CursorDestroy, NAME, "");
        self.inner.destroy().map_err(|e| e.with_operator(NAME))
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}
