//! Shared setup for integration tests
//!
//! customer -> order -> item, plus a sibling `address` under customer:
//!
//! c1: o10 (i100, i101), o11, a1
//! c2: o20
//! c3

#![allow(dead_code)]

use std::sync::Arc;

use hkeyexec::executor::{ExecutionConfig, QueryContext, RowCountMode};
use hkeyexec::row::{ColumnDef, ColumnType, GroupTable, HKey, Row, RowType, Schema, Value};
use hkeyexec::storage::{MemoryStoreAdapter, StoreAdapter, TableStatusCache};

pub struct TestDb {
    pub schema: Arc<Schema>,
    pub memory: Arc<MemoryStoreAdapter>,
    pub adapter: Arc<dyn StoreAdapter>,
    pub customer: Arc<RowType>,
    pub order: Arc<RowType>,
    pub item: Arc<RowType>,
    pub address: Arc<RowType>,
    pub count_type: Arc<RowType>,
}

impl TestDb {
    pub fn new() -> Self {
        Self::with_mode(RowCountMode::Exact)
    }

    pub fn with_mode(mode: RowCountMode) -> Self {
        let mut schema = Schema::new();
        let int = |name: &str| vec![ColumnDef::new(name, ColumnType::Int)];
        let customer = schema.new_table("customer", int("cid"), None).unwrap();
        let order = schema.new_table("order", int("oid"), customer.table_id()).unwrap();
        let item = schema.new_table("item", int("iid"), order.table_id()).unwrap();
        let address = schema.new_table("address", int("aid"), customer.table_id()).unwrap();
        let count_type = schema.new_values_type("count", int("count"));

        let schema = Arc::new(schema);
        let memory = Arc::new(
            MemoryStoreAdapter::new(Arc::clone(&schema), Arc::new(TableStatusCache::new()), mode).unwrap(),
        );
        let adapter: Arc<dyn StoreAdapter> = memory.clone();

        let db = Self {
            schema,
            memory,
            adapter,
            customer,
            order,
            item,
            address,
            count_type,
        };
        db.populate();
        db
    }

    fn populate(&self) {
        for cid in [1, 2, 3] {
            self.insert(&self.customer, self.c(cid), cid);
        }
        for (cid, oid) in [(1, 10), (1, 11), (2, 20)] {
            self.insert(&self.order, self.o(cid, oid), oid);
        }
        for iid in [100, 101] {
            self.insert(&self.item, self.i(1, 10, iid), iid);
        }
        self.insert(&self.address, self.a(1, 1), 1);
    }

    pub fn insert(&self, row_type: &Arc<RowType>, hkey: HKey, id: i64) {
        let row = Row::table_row(Arc::clone(row_type), hkey, vec![Value::Int(id)]).unwrap();
        self.memory.write_row(row).unwrap();
    }

    pub fn group(&self) -> GroupTable {
        self.schema
            .group_of(self.customer.table_id().unwrap())
            .cloned()
            .unwrap()
    }

    pub fn c(&self, cid: i64) -> HKey {
        HKey::root(self.customer.table_id().unwrap(), vec![Value::Int(cid)])
    }

    pub fn o(&self, cid: i64, oid: i64) -> HKey {
        self.c(cid).child(self.order.table_id().unwrap(), vec![Value::Int(oid)])
    }

    pub fn i(&self, cid: i64, oid: i64, iid: i64) -> HKey {
        self.o(cid, oid).child(self.item.table_id().unwrap(), vec![Value::Int(iid)])
    }

    pub fn a(&self, cid: i64, aid: i64) -> HKey {
        self.c(cid).child(self.address.table_id().unwrap(), vec![Value::Int(aid)])
    }

    pub fn context(&self) -> QueryContext {
        QueryContext::new(ExecutionConfig::default())
    }
}

pub fn hkeys(rows: &[Row]) -> Vec<HKey> {
    rows.iter().filter_map(|r| r.hkey().cloned()).collect()
}
