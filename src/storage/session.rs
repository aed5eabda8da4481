//! Sessions: the transaction context shared by the cursors of one query
//!
//! A session buffers its own row-count changes per table. Exact row-count
//! reads see committed counts plus these buffered changes; approximate
//! reads see committed counts only. Commit applies the buffer through the
//! table status cache.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::row::TableId;

/// Row-count change buffered by one session for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingRowCount {
    /// Point set, if any, applied before `delta`
    pub set_to: Option<i64>,
    /// Additive change since the point set (or since the committed value)
    pub delta: i64,
}

impl PendingRowCount {
    /// Count this session would observe given the committed value
    pub fn resolve(&self, committed: i64) -> i64 {
        self.set_to.unwrap_or(committed) + self.delta
    }
}

/// Transaction context for row-count bookkeeping
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    pending: BTreeMap<TableId, PendingRowCount>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            pending: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Buffered change for a table, if any
    pub fn pending(&self, table_id: TableId) -> Option<PendingRowCount> {
        self.pending.get(&table_id).copied()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn add_rows(&mut self, table_id: TableId, delta: i64) {
        self.pending.entry(table_id).or_default().delta += delta;
    }

    pub(crate) fn set_rows(&mut self, table_id: TableId, count: i64) {
        self.pending.insert(
            table_id,
            PendingRowCount {
                set_to: Some(count),
                delta: 0,
            },
        );
    }

    pub(crate) fn discard(&mut self, table_id: TableId) {
        self.pending.remove(&table_id);
    }

    pub(crate) fn take_pending(&mut self) -> BTreeMap<TableId, PendingRowCount> {
        std::mem::take(&mut self.pending)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
