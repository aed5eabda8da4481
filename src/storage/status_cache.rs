//! Table status cache
//!
//! Owns every `TableStatus`, keyed by table id. A single lock guards the
//! map; commits run under it, so at most one session applies row-count
//! changes at a time. Readers hold `Arc<TableStatus>` and never take the
//! lock after lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::observability::{log_event, Event};
use crate::row::TableId;

use super::errors::{StorageError, StorageResult};
use super::session::Session;
use super::table_status::{MemoryTableFactory, MemoryTableStatus, StoredTableStatus, TableStatus};

#[derive(Default)]
struct CacheState {
    statuses: HashMap<TableId, Arc<TableStatus>>,
}

/// Registry of table statuses
#[derive(Default)]
pub struct TableStatusCache {
    state: Mutex<CacheState>,
}

impl TableStatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, CacheState>> {
        self.state
            .lock()
            .map_err(|_| StorageError::lock_poisoned("table status cache"))
    }

    /// Stored status for `table_id`, created on first call
    pub fn create_table_status(&self, table_id: TableId) -> StorageResult<Arc<TableStatus>> {
        let mut state = self.lock()?;
        if let Some(existing) = state.statuses.get(&table_id) {
            return Ok(Arc::clone(existing));
        }
        let status = Arc::new(TableStatus::Stored(StoredTableStatus::new(table_id)));
        state.statuses.insert(table_id, Arc::clone(&status));
        log_event(
            Event::TableStatusCreated,
            &[("table_id", &table_id.to_string())],
        );
        Ok(status)
    }

    /// Memory status for `table_id`.
    ///
    /// An existing memory status keeps its unique-id counter and is
    /// re-attached to `factory`. A stored status under the same id is an
    /// error.
    pub fn get_or_create_memory_table_status(
        &self,
        table_id: TableId,
        factory: Arc<dyn MemoryTableFactory>,
    ) -> StorageResult<Arc<TableStatus>> {
        let mut state = self.lock()?;
        match state.statuses.get(&table_id) {
            Some(existing) => match existing.as_ref() {
                TableStatus::Memory(memory) => {
                    memory.attach(factory);
                    Ok(Arc::clone(existing))
                }
                TableStatus::Stored(_) => Err(StorageError::duplicate_key(format!(
                    "table {} (already a stored table)",
                    table_id
                ))),
            },
            None => {
                let name = factory.name().to_string();
                let status = Arc::new(TableStatus::Memory(MemoryTableStatus::new(table_id, factory)));
                state.statuses.insert(table_id, Arc::clone(&status));
                log_event(
                    Event::MemoryTableStatusCreated,
                    &[("name", &name), ("table_id", &table_id.to_string())],
                );
                Ok(status)
            }
        }
    }

    /// Status for `table_id`; unknown tables are an error
    pub fn table_status(&self, table_id: TableId) -> StorageResult<Arc<TableStatus>> {
        self.lock()?
            .statuses
            .get(&table_id)
            .cloned()
            .ok_or_else(|| StorageError::unknown_table(table_id.value()))
    }

    /// Number of registered statuses
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.lock()?.statuses.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Detach every memory status from its factory
    pub fn detach_schema(&self) -> StorageResult<()> {
        let state = self.lock()?;
        let mut detached = 0usize;
        for status in state.statuses.values() {
            if let TableStatus::Memory(memory) = status.as_ref() {
                memory.detach();
                detached += 1;
            }
        }
        log_event(Event::SchemaDetached, &[("detached", &detached.to_string())]);
        Ok(())
    }

    /// Reset a table's counters and drop `session`'s buffered changes for it.
    ///
    /// Memory statuses are removed outright.
    pub fn clear_table_status(&self, session: &mut Session, table_id: TableId) -> StorageResult<()> {
        let mut state = self.lock()?;
        let status = state
            .statuses
            .get(&table_id)
            .cloned()
            .ok_or_else(|| StorageError::unknown_table(table_id.value()))?;
        session.discard(table_id);
        match status.as_ref() {
            TableStatus::Stored(stored) => stored.clear(),
            TableStatus::Memory(_) => {
                state.statuses.remove(&table_id);
            }
        }
        log_event(
            Event::TableStatusCleared,
            &[("kind", status.kind()), ("table_id", &table_id.to_string())],
        );
        Ok(())
    }

    /// Clear and unregister a table
    pub fn drop_table(&self, session: &mut Session, table_id: TableId) -> StorageResult<()> {
        self.clear_table_status(session, table_id)?;
        self.lock()?.statuses.remove(&table_id);
        Ok(())
    }

    /// Apply `session`'s buffered row-count changes.
    ///
    /// Changes for tables dropped since they were buffered are discarded.
    pub fn commit(&self, session: &mut Session) -> StorageResult<()> {
        let state = self.lock()?;
        let pending = session.take_pending();
        let mut applied = 0usize;
        for (table_id, change) in pending {
            if let Some(TableStatus::Stored(stored)) = state.statuses.get(&table_id).map(|s| s.as_ref()) {
                stored.apply(change);
                applied += 1;
            }
        }
        log_event(
            Event::SessionCommit,
            &[("session_id", &session.id().to_string()), ("tables", &applied.to_string())],
        );
        Ok(())
    }

    /// Discard `session`'s buffered row-count changes
    pub fn rollback(&self, session: &mut Session) {
        let discarded = session.take_pending().len();
        log_event(
            Event::SessionRollback,
            &[("session_id", &session.id().to_string()), ("tables", &discarded.to_string())],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageErrorCode;

    const ORDERS: TableId = TableId::new(2);
    const VIRTUAL: TableId = TableId::new(100);

    struct Rows(i64);

    impl MemoryTableFactory for Rows {
        fn name(&self) -> &str {
            "sessions"
        }

        fn row_count(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn test_create_is_idempotent() {
        let cache = TableStatusCache::new();
        let a = cache.create_table_status(ORDERS).unwrap();
        let b = cache.create_table_status(ORDERS).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_unknown_table() {
        let cache = TableStatusCache::new();
        let err = cache.table_status(ORDERS).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::HkxStorageUnknownTable);
    }

    #[test]
    fn test_commit_publishes_counts() {
        let cache = TableStatusCache::new();
        let status = cache.create_table_status(ORDERS).unwrap();
        let mut writer = Session::new();
        status.rows_written(&mut writer, 4);

        assert_eq!(status.approximate_row_count(), 0);
        cache.commit(&mut writer).unwrap();
        assert_eq!(status.approximate_row_count(), 4);
        assert_eq!(status.row_count(&Session::new()), 4);
    }

    #[test]
    fn test_rollback_discards_counts() {
        let cache = TableStatusCache::new();
        let status = cache.create_table_status(ORDERS).unwrap();
        let mut writer = Session::new();
        status.rows_written(&mut writer, 4);
        cache.rollback(&mut writer);
        cache.commit(&mut writer).unwrap();
        assert_eq!(status.approximate_row_count(), 0);
    }

    #[test]
    fn test_clear_resets_counters_and_pending() {
        let cache = TableStatusCache::new();
        let status = cache.create_table_status(ORDERS).unwrap();
        let mut session = Session::new();
        status.rows_written(&mut session, 3);
        cache.commit(&mut session).unwrap();
        status.create_new_unique_id();
        status.rows_written(&mut session, 1);

        cache.clear_table_status(&mut session, ORDERS).unwrap();
        assert_eq!(status.row_count(&session), 0);
        assert_eq!(status.unique_id(), 0);
        assert!(!session.has_pending_changes());
    }

    #[test]
    fn test_drop_table_unregisters() {
        let cache = TableStatusCache::new();
        cache.create_table_status(ORDERS).unwrap();
        let mut session = Session::new();
        cache.drop_table(&mut session, ORDERS).unwrap();
        assert!(cache.table_status(ORDERS).is_err());
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_memory_status_detach_and_reattach() {
        let cache = TableStatusCache::new();
        let status = cache
            .get_or_create_memory_table_status(VIRTUAL, Arc::new(Rows(7)))
            .unwrap();
        let id = status.create_new_unique_id();
        assert_eq!(status.approximate_row_count(), 7);

        cache.detach_schema().unwrap();
        assert_eq!(status.approximate_row_count(), 0);

        let again = cache
            .get_or_create_memory_table_status(VIRTUAL, Arc::new(Rows(9)))
            .unwrap();
        assert!(Arc::ptr_eq(&status, &again));
        assert_eq!(again.approximate_row_count(), 9);
        assert!(again.create_new_unique_id() > id);
    }

    #[test]
    fn test_memory_status_conflicts_with_stored() {
        let cache = TableStatusCache::new();
        cache.create_table_status(ORDERS).unwrap();
        assert!(cache
            .get_or_create_memory_table_status(ORDERS, Arc::new(Rows(1)))
            .is_err());
    }
}
