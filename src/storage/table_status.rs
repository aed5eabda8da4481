//! Per-table counters: row count, auto-increment, unique ids
//!
//! The back-end is chosen once, when the table is registered:
//!
//! - `Stored`: atomic counters. Row-count changes are buffered in the
//!   writer's session and applied on commit; auto-increment and unique ids
//!   take effect immediately, outside any session (gaps are acceptable,
//!   duplicates are not).
//! - `Memory`: virtual tables whose row count is computed by a factory.
//!   Nothing is persisted; writes are ignored.
//!
//! The engine only ever issues additive or point-set requests; no caller
//! performs read-modify-write on these counters.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::row::TableId;

use super::session::{PendingRowCount, Session};

/// Row-count source for a virtual (memory) table
pub trait MemoryTableFactory: Send + Sync {
    /// Name of the virtual table
    fn name(&self) -> &str;

    /// Current number of rows
    fn row_count(&self) -> i64;
}

/// Counters for a table whose rows live in a group table
#[derive(Debug)]
pub struct StoredTableStatus {
    table_id: TableId,
    row_count: AtomicI64,
    auto_increment: AtomicI64,
    unique_id: AtomicI64,
}

impl StoredTableStatus {
    pub(crate) fn new(table_id: TableId) -> Self {
        Self {
            table_id,
            row_count: AtomicI64::new(0),
            auto_increment: AtomicI64::new(0),
            unique_id: AtomicI64::new(0),
        }
    }

    fn committed_row_count(&self) -> i64 {
        self.row_count.load(Ordering::SeqCst)
    }

    pub(crate) fn apply(&self, pending: PendingRowCount) {
        match pending.set_to {
            Some(base) => self.row_count.store(base + pending.delta, Ordering::SeqCst),
            None => {
                self.row_count.fetch_add(pending.delta, Ordering::SeqCst);
            }
        }
    }

    fn set_auto_increment(&self, value: i64, even_if_less: bool) {
        if even_if_less {
            self.auto_increment.store(value, Ordering::SeqCst);
        } else {
            self.auto_increment.fetch_max(value, Ordering::SeqCst);
        }
    }

    pub(crate) fn clear(&self) {
        self.row_count.store(0, Ordering::SeqCst);
        self.auto_increment.store(0, Ordering::SeqCst);
        self.unique_id.store(0, Ordering::SeqCst);
    }
}

/// Counters for a virtual table
pub struct MemoryTableStatus {
    table_id: TableId,
    factory: RwLock<Option<Arc<dyn MemoryTableFactory>>>,
    unique_id: AtomicI64,
}

impl MemoryTableStatus {
    pub(crate) fn new(table_id: TableId, factory: Arc<dyn MemoryTableFactory>) -> Self {
        Self {
            table_id,
            factory: RwLock::new(Some(factory)),
            unique_id: AtomicI64::new(0),
        }
    }

    fn row_count(&self) -> i64 {
        self.factory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|f| f.row_count())
            .unwrap_or(0)
    }

    pub(crate) fn attach(&self, factory: Arc<dyn MemoryTableFactory>) {
        *self.factory.write().unwrap_or_else(PoisonError::into_inner) = Some(factory);
    }

    /// Drop the factory; counts read 0 until re-registered
    pub(crate) fn detach(&self) {
        *self.factory.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_attached(&self) -> bool {
        self.factory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for MemoryTableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTableStatus")
            .field("table_id", &self.table_id)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Table status, with its back-end fixed at registration
#[derive(Debug)]
pub enum TableStatus {
    Stored(StoredTableStatus),
    Memory(MemoryTableStatus),
}

impl TableStatus {
    pub fn table_id(&self) -> TableId {
        match self {
            TableStatus::Stored(s) => s.table_id,
            TableStatus::Memory(m) => m.table_id,
        }
    }

    /// Back-end name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            TableStatus::Stored(_) => "stored",
            TableStatus::Memory(_) => "memory",
        }
    }

    /// Record `count` rows written (negative for deletions) in `session`
    pub fn rows_written(&self, session: &mut Session, count: i64) {
        if let TableStatus::Stored(s) = self {
            session.add_rows(s.table_id, count);
        }
    }

    /// Record one row deleted in `session`
    pub fn row_deleted(&self, session: &mut Session) {
        self.rows_written(session, -1);
    }

    /// Point-set the row count in `session`
    pub fn set_row_count(&self, session: &mut Session, row_count: i64) {
        if let TableStatus::Stored(s) = self {
            session.set_rows(s.table_id, row_count);
        }
    }

    /// Row count reset to 0 in `session`; auto-increment reset immediately
    pub fn truncate(&self, session: &mut Session) {
        if let TableStatus::Stored(s) = self {
            session.set_rows(s.table_id, 0);
            s.set_auto_increment(0, true);
        }
    }

    /// Committed count plus the session's own buffered changes
    pub fn row_count(&self, session: &Session) -> i64 {
        match self {
            TableStatus::Stored(s) => {
                let committed = s.committed_row_count();
                session
                    .pending(s.table_id)
                    .map(|p| p.resolve(committed))
                    .unwrap_or(committed)
            }
            TableStatus::Memory(m) => m.row_count(),
        }
    }

    /// Committed count only; never waits on or conflicts with writers
    pub fn approximate_row_count(&self) -> i64 {
        match self {
            TableStatus::Stored(s) => s.row_count.load(Ordering::Relaxed),
            TableStatus::Memory(m) => m.row_count(),
        }
    }

    /// Auto-increment high-water mark
    pub fn auto_increment(&self) -> i64 {
        match self {
            TableStatus::Stored(s) => s.auto_increment.load(Ordering::SeqCst),
            TableStatus::Memory(_) => 0,
        }
    }

    /// Raise the auto-increment high-water mark; lower values are ignored
    pub fn set_auto_increment(&self, value: i64) {
        if let TableStatus::Stored(s) = self {
            s.set_auto_increment(value, false);
        }
    }

    /// Set the auto-increment value even if it is lower (reset paths)
    pub fn reset_auto_increment(&self, value: i64) {
        if let TableStatus::Stored(s) = self {
            s.set_auto_increment(value, true);
        }
    }

    /// Issue a new unique id (strictly greater than every earlier one)
    pub fn create_new_unique_id(&self) -> i64 {
        let counter = match self {
            TableStatus::Stored(s) => &s.unique_id,
            TableStatus::Memory(m) => &m.unique_id,
        };
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last issued unique id
    pub fn unique_id(&self) -> i64 {
        match self {
            TableStatus::Stored(s) => s.unique_id.load(Ordering::SeqCst),
            TableStatus::Memory(m) => m.unique_id.load(Ordering::SeqCst),
        }
    }

    /// Last issued unique id, possibly stale
    pub fn approximate_unique_id(&self) -> i64 {
        match self {
            TableStatus::Stored(s) => s.unique_id.load(Ordering::Relaxed),
            TableStatus::Memory(m) => m.unique_id.load(Ordering::Relaxed),
        }
    }
}
