//! In-memory store adapter
//!
//! Each group table is a `BTreeMap` keyed by hkey, so map order is hkey
//! order and a descendant range is a contiguous run starting at its
//! ancestor. Cursors remember the last hkey they returned and resume just
//! after it, so concurrent writers never invalidate a cursor position.
//!
//! Row-count bookkeeping goes through the shared `TableStatusCache`; writes
//! are buffered in the adapter's session until `commit`.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use uuid::Uuid;

use crate::executor::{
    Bindings, Cursor, CursorLifecycle, CursorState, ExecutionError, ExecutionResult, RowCountMode,
};
use crate::row::{GroupId, GroupTable, HKey, Row, RowType, Schema, TableId};

use super::adapter::{BoxedGroupCursor, GroupCursor, StoreAdapter};
use super::errors::{StorageError, StorageResult};
use super::session::Session;
use super::status_cache::TableStatusCache;
use super::table_status::{MemoryTableFactory, TableStatus};

type GroupRows = Arc<RwLock<BTreeMap<HKey, Row>>>;

/// Store adapter keeping every group table in memory
pub struct MemoryStoreAdapter {
    schema: Arc<Schema>,
    groups: HashMap<GroupId, GroupRows>,
    status_cache: Arc<TableStatusCache>,
    session: Mutex<Session>,
    row_count_mode: RowCountMode,
}

impl MemoryStoreAdapter {
    /// Empty store for every group in `schema`; registers a stored table
    /// status for each table.
    pub fn new(
        schema: Arc<Schema>,
        status_cache: Arc<TableStatusCache>,
        row_count_mode: RowCountMode,
    ) -> StorageResult<Self> {
        let groups = schema
            .groups()
            .map(|g| (g.id(), GroupRows::default()))
            .collect();
        for table in schema.tables() {
            if let Some(table_id) = table.table_id() {
                status_cache.create_table_status(table_id)?;
            }
        }
        Ok(Self {
            schema,
            groups,
            status_cache,
            session: Mutex::new(Session::new()),
            row_count_mode,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn status_cache(&self) -> &Arc<TableStatusCache> {
        &self.status_cache
    }

    pub fn row_count_mode(&self) -> RowCountMode {
        self.row_count_mode
    }

    pub fn session_id(&self) -> StorageResult<Uuid> {
        Ok(self.session()?.id())
    }

    fn session(&self) -> StorageResult<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| StorageError::lock_poisoned("session"))
    }

    fn group_rows(&self, group_id: GroupId) -> StorageResult<&GroupRows> {
        self.groups
            .get(&group_id)
            .ok_or_else(|| StorageError::unknown_group(group_id.value()))
    }

    fn group_rows_for(&self, table_id: TableId) -> StorageResult<&GroupRows> {
        let group = self
            .schema
            .group_of(table_id)
            .ok_or_else(|| StorageError::unknown_table(table_id.value()))?;
        self.group_rows(group.id())
    }

    /// Store a table row and count it in the adapter's session
    pub fn write_row(&self, row: Row) -> ExecutionResult<()> {
        let (hkey, table_id) = match (row.hkey(), row.row_type().table_id()) {
            (Some(hkey), Some(table_id)) => (hkey.clone(), table_id),
            _ => {
                return Err(ExecutionError::invalid_argument(
                    "MemoryStoreAdapter",
                    format!("{} is not a table row", row.row_type()),
                ))
            }
        };
        {
            let mut rows = self
                .group_rows_for(table_id)?
                .write()
                .map_err(|_| StorageError::lock_poisoned("group rows"))?;
            if rows.contains_key(&hkey) {
                return Err(StorageError::duplicate_key(&hkey).into());
            }
            rows.insert(hkey, row);
        }
        let status = self.status_cache.table_status(table_id)?;
        status.rows_written(&mut *self.session()?, 1);
        Ok(())
    }

    /// Remove the row at `hkey`; descendants are left in place
    pub fn delete_row(&self, hkey: &HKey) -> ExecutionResult<bool> {
        let table_id = hkey.table_id().ok_or_else(|| {
            ExecutionError::invalid_argument("MemoryStoreAdapter", "cannot delete the empty hkey")
        })?;
        let removed = self
            .group_rows_for(table_id)?
            .write()
            .map_err(|_| StorageError::lock_poisoned("group rows"))?
            .remove(hkey)
            .is_some();
        if removed {
            let status = self.status_cache.table_status(table_id)?;
            status.row_deleted(&mut *self.session()?);
        }
        Ok(removed)
    }

    /// Register a virtual table whose row count comes from `factory`
    pub fn register_memory_table(
        &self,
        table_id: TableId,
        factory: Arc<dyn MemoryTableFactory>,
    ) -> StorageResult<Arc<TableStatus>> {
        self.status_cache
            .get_or_create_memory_table_status(table_id, factory)
    }

    /// Publish the session's buffered row-count changes
    pub fn commit(&self) -> StorageResult<()> {
        self.status_cache.commit(&mut *self.session()?)
    }

    /// Discard the session's buffered row-count changes.
    ///
    /// Rows already written stay written; only the counts are discarded.
    pub fn rollback(&self) -> StorageResult<()> {
        self.status_cache.rollback(&mut *self.session()?);
        Ok(())
    }
}

impl StoreAdapter for MemoryStoreAdapter {
    fn new_group_cursor(&self, group: &GroupTable) -> ExecutionResult<BoxedGroupCursor> {
        let rows = Arc::clone(self.group_rows(group.id())?);
        Ok(Box::new(MemoryGroupCursor::new(rows)))
    }

    fn row_count(&self, row_type: &RowType) -> ExecutionResult<i64> {
        let table_id = row_type.table_id().ok_or_else(|| {
            ExecutionError::invalid_argument(
                "MemoryStoreAdapter",
                format!("{} is not a table row type", row_type),
            )
        })?;
        let status = self.status_cache.table_status(table_id)?;
        let count = match self.row_count_mode {
            RowCountMode::Exact => {
                let session = self.session()?;
                status.row_count(&session)
            }
            RowCountMode::Approximate => status.approximate_row_count(),
        };
        Ok(count)
    }
}

/// Group cursor over an in-memory group table
struct MemoryGroupCursor {
    lifecycle: CursorLifecycle,
    rows: GroupRows,
    /// Hkey and depth from the last `rebind`
    start: Option<(HKey, bool)>,
    /// Hkey of the last row returned since `open`
    position: Option<HKey>,
}

impl MemoryGroupCursor {
    fn new(rows: GroupRows) -> Self {
        Self {
            lifecycle: CursorLifecycle::new("GroupCursor"),
            rows,
            start: None,
            position: None,
        }
    }

    fn in_range(&self, hkey: &HKey) -> bool {
        match &self.start {
            None => true,
            Some((start, true)) => start.is_prefix_of(hkey),
            Some((start, false)) => start == hkey,
        }
    }
}

impl Cursor for MemoryGroupCursor {
    fn open(&mut self, _bindings: &Bindings) -> ExecutionResult<()> {
        self.lifecycle.check_idle()?;
        self.position = None;
        self.lifecycle.activate();
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        self.lifecycle.check_active()?;
        let found = {
            let rows = self
                .rows
                .read()
                .map_err(|_| StorageError::lock_poisoned("group rows"))?;
            let lower = match (&self.position, &self.start) {
                (Some(last), _) => Bound::Excluded(last),
                (None, Some((start, _))) => Bound::Included(start),
                (None, None) => Bound::Unbounded,
            };
            rows.range::<HKey, _>((lower, Bound::Unbounded))
                .next()
                .filter(|(hkey, _)| self.in_range(hkey))
                .map(|(hkey, row)| (hkey.clone(), row.clone()))
        };
        match found {
            Some((hkey, row)) => {
                self.position = Some(hkey);
                Ok(Some(row))
            }
            None => {
                self.position = None;
                self.lifecycle.deactivate();
                Ok(None)
            }
        }
    }

    fn close(&mut self) -> ExecutionResult<()> {
        self.lifecycle.check_idle_or_active()?;
        self.position = None;
        self.lifecycle.deactivate();
        Ok(())
    }

    fn destroy(&mut self) -> ExecutionResult<()> {
        self.lifecycle.destroy()?;
        self.position = None;
        self.start = None;
        Ok(())
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}

impl GroupCursor for MemoryGroupCursor {
    fn rebind(&mut self, hkey: HKey, deep: bool) -> ExecutionResult<()> {
        self.lifecycle.check_idle()?;
        self.start = Some((hkey, deep));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::collect_rows;
    use crate::row::{ColumnDef, ColumnType, Value};
    use crate::storage::StorageErrorCode;

    struct Fixture {
        adapter: MemoryStoreAdapter,
        customer: Arc<RowType>,
        order: Arc<RowType>,
    }

    fn fixture(mode: RowCountMode) -> Fixture {
        let mut schema = Schema::new();
        let customer = schema
            .new_table("customer", vec![ColumnDef::new("cid", ColumnType::Int)], None)
            .unwrap();
        let order = schema
            .new_table(
                "order",
                vec![ColumnDef::new("oid", ColumnType::Int)],
                customer.table_id(),
            )
            .unwrap();
        let adapter =
            MemoryStoreAdapter::new(Arc::new(schema), Arc::new(TableStatusCache::new()), mode).unwrap();
        Fixture {
            adapter,
            customer,
            order,
        }
    }

    fn customer_key(f: &Fixture, cid: i64) -> HKey {
        HKey::root(f.customer.table_id().unwrap(), vec![Value::Int(cid)])
    }

    fn order_key(f: &Fixture, cid: i64, oid: i64) -> HKey {
        customer_key(f, cid).child(f.order.table_id().unwrap(), vec![Value::Int(oid)])
    }

    fn populate(f: &Fixture) {
        for cid in [2, 1] {
            let hkey = customer_key(f, cid);
            f.adapter
                .write_row(Row::table_row(Arc::clone(&f.customer), hkey, vec![Value::Int(cid)]).unwrap())
                .unwrap();
            for oid in [20, 10] {
                let hkey = order_key(f, cid, oid);
                f.adapter
                    .write_row(Row::table_row(Arc::clone(&f.order), hkey, vec![Value::Int(oid)]).unwrap())
                    .unwrap();
            }
        }
    }

    fn group(f: &Fixture) -> GroupTable {
        f.adapter
            .schema()
            .group_of(f.customer.table_id().unwrap())
            .cloned()
            .unwrap()
    }

    fn keys(rows: &[Row]) -> Vec<HKey> {
        rows.iter().map(|r| r.hkey().cloned().unwrap()).collect()
    }

    #[test]
    fn test_full_scan_in_hkey_order() {
        let f = fixture(RowCountMode::Exact);
        populate(&f);
        let mut cursor = f.adapter.new_group_cursor(&group(&f)).unwrap();
        let rows = collect_rows(cursor.as_mut(), &Bindings::new(0)).unwrap();

        assert_eq!(
            keys(&rows),
            vec![
                customer_key(&f, 1),
                order_key(&f, 1, 10),
                order_key(&f, 1, 20),
                customer_key(&f, 2),
                order_key(&f, 2, 10),
                order_key(&f, 2, 20),
            ]
        );
    }

    #[test]
    fn test_deep_and_shallow_rebind() {
        let f = fixture(RowCountMode::Exact);
        populate(&f);
        let mut cursor = f.adapter.new_group_cursor(&group(&f)).unwrap();

        cursor.rebind(customer_key(&f, 1), true).unwrap();
        let deep = collect_rows(cursor.as_mut(), &Bindings::new(0)).unwrap();
        assert_eq!(
            keys(&deep),
            vec![customer_key(&f, 1), order_key(&f, 1, 10), order_key(&f, 1, 20)]
        );

        cursor.rebind(customer_key(&f, 2), false).unwrap();
        let shallow = collect_rows(cursor.as_mut(), &Bindings::new(0)).unwrap();
        assert_eq!(keys(&shallow), vec![customer_key(&f, 2)]);
    }

    #[test]
    fn test_deep_scan_of_missing_ancestor_returns_descendants() {
        let f = fixture(RowCountMode::Exact);
        let hkey = order_key(&f, 5, 50);
        f.adapter
            .write_row(Row::table_row(Arc::clone(&f.order), hkey.clone(), vec![Value::Int(50)]).unwrap())
            .unwrap();

        let mut cursor = f.adapter.new_group_cursor(&group(&f)).unwrap();
        cursor.rebind(customer_key(&f, 5), true).unwrap();
        assert_eq!(keys(&collect_rows(cursor.as_mut(), &Bindings::new(0)).unwrap()), vec![hkey]);

        cursor.rebind(customer_key(&f, 5), false).unwrap();
        assert!(collect_rows(cursor.as_mut(), &Bindings::new(0)).unwrap().is_empty());
    }

    #[test]
    fn test_rebind_requires_idle() {
        let f = fixture(RowCountMode::Exact);
        populate(&f);
        let mut cursor = f.adapter.new_group_cursor(&group(&f)).unwrap();
        cursor.open(&Bindings::new(0)).unwrap();
        let err = cursor.rebind(customer_key(&f, 1), true).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let f = fixture(RowCountMode::Exact);
        populate(&f);
        let row = Row::table_row(Arc::clone(&f.customer), customer_key(&f, 1), vec![Value::Int(1)]).unwrap();
        let err = f.adapter.write_row(row).unwrap_err();
        assert_eq!(
            err.storage_error().map(|e| e.code()),
            Some(StorageErrorCode::HkxStorageDuplicateKey)
        );
    }

    #[test]
    fn test_exact_count_sees_uncommitted_writes() {
        let f = fixture(RowCountMode::Exact);
        populate(&f);
        assert_eq!(f.adapter.row_count(&f.order).unwrap(), 4);
        assert!(f.adapter.delete_row(&order_key(&f, 1, 10)).unwrap());
        assert_eq!(f.adapter.row_count(&f.order).unwrap(), 3);
    }

    #[test]
    fn test_approximate_count_sees_commits_only() {
        let f = fixture(RowCountMode::Approximate);
        populate(&f);
        assert_eq!(f.adapter.row_count(&f.customer).unwrap(), 0);
        f.adapter.commit().unwrap();
        assert_eq!(f.adapter.row_count(&f.customer).unwrap(), 2);
    }
}
