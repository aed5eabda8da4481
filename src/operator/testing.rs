//! Shared fixture for operator tests
//!
//! customer(1) -> order(10) -> item(100)
//!             -> order(11)
//! customer(2) -> order(20)
//! customer(3)

use std::sync::Arc;

use crate::executor::{ExecutionConfig, QueryContext, RowCountMode};
use crate::row::{ColumnDef, ColumnType, GroupTable, HKey, Row, RowType, Schema, TableId, Value};
use crate::storage::{MemoryStoreAdapter, StoreAdapter, TableStatusCache};

pub(crate) const CUSTOMER: TableId = TableId::new(1);
pub(crate) const ORDER: TableId = TableId::new(2);
pub(crate) const ITEM: TableId = TableId::new(3);

pub(crate) struct Fixture {
    pub schema: Arc<Schema>,
    pub memory: Arc<MemoryStoreAdapter>,
    pub adapter: Arc<dyn StoreAdapter>,
    pub context: QueryContext,
    pub customer: Arc<RowType>,
    pub order: Arc<RowType>,
    pub item: Arc<RowType>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_mode(RowCountMode::Exact)
    }

    pub fn with_mode(mode: RowCountMode) -> Self {
        let mut schema = Schema::new();
        let customer = schema
            .new_table("customer", vec![ColumnDef::new("cid", ColumnType::Int)], None)
            .unwrap();
        let order = schema
            .new_table("order", vec![ColumnDef::new("oid", ColumnType::Int)], Some(CUSTOMER))
            .unwrap();
        let item = schema
            .new_table("item", vec![ColumnDef::new("iid", ColumnType::Int)], Some(ORDER))
            .unwrap();
        let schema = Arc::new(schema);
        let memory = Arc::new(
            MemoryStoreAdapter::new(Arc::clone(&schema), Arc::new(TableStatusCache::new()), mode).unwrap(),
        );
        let adapter: Arc<dyn StoreAdapter> = memory.clone();

        let fixture = Self {
            schema,
            memory,
            adapter,
            context: QueryContext::new(ExecutionConfig::default()),
            customer,
            order,
            item,
        };
        fixture.populate();
        fixture
    }

    fn populate(&self) {
        for cid in [1, 2, 3] {
            self.write(&self.customer, self.customer_key(cid), cid);
        }
        for (cid, oid) in [(1, 10), (1, 11), (2, 20)] {
            self.write(&self.order, self.order_key(cid, oid), oid);
        }
        self.write(&self.item, self.item_key(1, 10, 100), 100);
    }

    fn write(&self, row_type: &Arc<RowType>, hkey: HKey, id: i64) {
        let row = Row::table_row(Arc::clone(row_type), hkey, vec![Value::Int(id)]).unwrap();
        self.memory.write_row(row).unwrap();
    }

    pub fn total_rows(&self) -> usize {
        7
    }

    pub fn group(&self) -> GroupTable {
        self.schema.group_of(CUSTOMER).cloned().unwrap()
    }

    pub fn customer_key(&self, cid: i64) -> HKey {
        HKey::root(CUSTOMER, vec![Value::Int(cid)])
    }

    pub fn order_key(&self, cid: i64, oid: i64) -> HKey {
        self.customer_key(cid).child(ORDER, vec![Value::Int(oid)])
    }

    pub fn item_key(&self, cid: i64, oid: i64, iid: i64) -> HKey {
        self.order_key(cid, oid).child(ITEM, vec![Value::Int(iid)])
    }
}

pub(crate) fn keys(rows: &[Row]) -> Vec<HKey> {
    rows.iter().filter_map(|r| r.hkey().cloned()).collect()
}
