//! JSON fixtures: a schema plus the rows to load into a memory store
//!
//! ```json
//! {
//!   "tables": [
//!     {"name": "customer", "columns": [{"name": "cid", "column_type": "int"}]},
//!     {"name": "order", "parent": "customer",
//!      "columns": [{"name": "oid", "column_type": "int"}]}
//!   ],
//!   "rows": [
//!     {"table": "customer", "hkey": [[1]], "values": [1]},
//!     {"table": "order", "hkey": [[1], [10]], "values": [10]}
//!   ]
//! }
//! ```
//!
//! An hkey is written as one list of key values per level, root first.
//! Rows are committed after loading unless `"commit": false`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::executor::{ExecutionError, RowCountMode};
use crate::observability::{log_event, Event};
use crate::row::{ColumnDef, ColumnType, HKey, HKeySegment, Row, RowType, Schema, Value};
use crate::storage::{MemoryStoreAdapter, StorageError, TableStatusCache};

/// Fixture loading errors
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid fixture JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("hkey for table '{table}' needs {expected} levels, got {actual}")]
    HKeyDepth {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("column '{column}' of table '{table}' expects {expected:?}, got {value}")]
    ValueType {
        table: String,
        column: String,
        expected: ColumnType,
        value: Value,
    },

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    tables: Vec<TableSpec>,
    #[serde(default)]
    rows: Vec<RowSpec>,
    #[serde(default = "default_commit")]
    commit: bool,
}

fn default_commit() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableSpec {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    columns: Vec<ColumnDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RowSpec {
    table: String,
    hkey: Vec<Vec<Value>>,
    values: Vec<Value>,
}

/// A parsed fixture: the schema is still mutable so operators can issue
/// their derived row types before the store is built.
#[derive(Debug)]
pub struct Fixture {
    pub schema: Schema,
    rows: Vec<Row>,
    commit: bool,
}

/// A loaded memory store
pub struct FixtureStore {
    pub schema: Arc<Schema>,
    pub adapter: Arc<MemoryStoreAdapter>,
}

impl Fixture {
    /// Load a fixture file
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let content = fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a fixture document
    pub fn from_json_str(content: &str) -> Result<Self, FixtureError> {
        let file: FixtureFile = serde_json::from_str(content)?;

        let mut schema = Schema::new();
        for table in &file.tables {
            let parent = match &table.parent {
                Some(name) => Some(
                    schema
                        .table_by_name(name)
                        .and_then(|t| t.table_id())
                        .ok_or_else(|| FixtureError::UnknownTable(name.clone()))?,
                ),
                None => None,
            };
            schema.new_table(table.name.clone(), table.columns.clone(), parent)?;
        }

        let mut rows = Vec::with_capacity(file.rows.len());
        for spec in file.rows {
            let row_type = schema
                .table_by_name(&spec.table)
                .cloned()
                .ok_or_else(|| FixtureError::UnknownTable(spec.table.clone()))?;
            check_values(&row_type, &spec.values)?;
            let hkey = build_hkey(&schema, &row_type, &spec.hkey)?;
            rows.push(Row::table_row(row_type, hkey, spec.values)?);
        }

        Ok(Self {
            schema,
            rows,
            commit: file.commit,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Build a memory store holding every fixture row
    pub fn into_store(self, row_count_mode: RowCountMode) -> Result<FixtureStore, FixtureError> {
        let schema = Arc::new(self.schema);
        let adapter = Arc::new(MemoryStoreAdapter::new(
            Arc::clone(&schema),
            Arc::new(TableStatusCache::new()),
            row_count_mode,
        )?);
        let loaded = self.rows.len();
        for row in self.rows {
            adapter.write_row(row)?;
        }
        if self.commit {
            adapter.commit()?;
        }
        log_event(
            Event::FixtureLoaded,
            &[
                ("committed", if self.commit { "true" } else { "false" }),
                ("rows", &loaded.to_string()),
                ("tables", &schema.tables().count().to_string()),
            ],
        );
        Ok(FixtureStore { schema, adapter })
    }
}

/// Build the hkey of a `table` row from per-level key values, root first
pub fn build_hkey(schema: &Schema, table: &RowType, levels: &[Vec<Value>]) -> Result<HKey, FixtureError> {
    let mut chain = Vec::new();
    let mut current = table.table_info();
    while let Some(info) = current {
        chain.push(info.table_id);
        current = info
            .parent
            .and_then(|parent| schema.table(parent))
            .and_then(|t| t.table_info());
    }
    chain.reverse();

    if chain.len() != levels.len() {
        return Err(FixtureError::HKeyDepth {
            table: table.name().to_string(),
            expected: chain.len(),
            actual: levels.len(),
        });
    }

    let segments = chain
        .into_iter()
        .zip(levels)
        .map(|(table_id, values)| HKeySegment::new(table_id, values.clone()))
        .collect();
    Ok(HKey::new(segments))
}

fn check_values(row_type: &RowType, values: &[Value]) -> Result<(), FixtureError> {
    for (column, value) in row_type.columns().iter().zip(values) {
        let matches = matches!(
            (column.column_type, value),
            (_, Value::Null)
                | (ColumnType::Int, Value::Int(_))
                | (ColumnType::Text, Value::Text(_))
                | (ColumnType::Bool, Value::Bool(_))
        );
        if !matches {
            return Err(FixtureError::ValueType {
                table: row_type.name().to_string(),
                column: column.name.clone(),
                expected: column.column_type,
                value: value.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreAdapter;
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "tables": [
            {"name": "customer", "columns": [{"name": "cid", "column_type": "int"}]},
            {"name": "order", "parent": "customer",
             "columns": [{"name": "oid", "column_type": "int"}, {"name": "note", "column_type": "text"}]}
        ],
        "rows": [
            {"table": "customer", "hkey": [[1]], "values": [1]},
            {"table": "order", "hkey": [[1], [10]], "values": [10, "first"]},
            {"table": "order", "hkey": [[1], [11]], "values": [11, null]}
        ]
    }"#;

    #[test]
    fn test_parse_fixture() {
        let fixture = Fixture::from_json_str(FIXTURE).unwrap();
        assert_eq!(fixture.row_count(), 3);
        let order = fixture.schema.table_by_name("order").unwrap();
        let customer = fixture.schema.table_by_name("customer").unwrap();
        assert_eq!(order.table_info().unwrap().parent, customer.table_id());
    }

    #[test]
    fn test_build_hkey_follows_ancestors() {
        let fixture = Fixture::from_json_str(FIXTURE).unwrap();
        let order = fixture.schema.table_by_name("order").unwrap();
        let hkey = build_hkey(&fixture.schema, order, &[vec![Value::Int(1)], vec![Value::Int(10)]]).unwrap();
        assert_eq!(hkey.depth(), 2);
        assert_eq!(hkey.table_id(), order.table_id());

        let err = build_hkey(&fixture.schema, order, &[vec![Value::Int(1)]]).unwrap_err();
        assert!(matches!(err, FixtureError::HKeyDepth { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_unknown_parent() {
        let err = Fixture::from_json_str(
            r#"{"tables": [{"name": "t", "parent": "nope", "columns": []}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FixtureError::UnknownTable(name) if name == "nope"));
    }

    #[test]
    fn test_column_type_checked() {
        let err = Fixture::from_json_str(
            r#"{"tables": [{"name": "t", "columns": [{"name": "id", "column_type": "int"}]}],
                "rows": [{"table": "t", "hkey": [["x"]], "values": ["x"]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FixtureError::ValueType { .. }));
    }

    #[test]
    fn test_load_into_store_commits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let store = Fixture::load(file.path())
            .unwrap()
            .into_store(RowCountMode::Approximate)
            .unwrap();
        let order = store.schema.table_by_name("order").unwrap();
        assert_eq!(store.adapter.row_count(order).unwrap(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = Fixture::load(Path::new("/nonexistent/fixture.json")).unwrap_err();
        assert!(matches!(err, FixtureError::Read { .. }));
    }
}
