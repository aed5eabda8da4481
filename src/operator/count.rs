//! Count of a table's rows, read from its table status
//!
//! Yields exactly one row and never scans. The count comes from the
//! adapter, so exact vs approximate is the adapter's choice.

use std::collections::HashSet;
use std::sync::Arc;

use crate::executor::{
    Bindings, BoxedCursor, Cursor, CursorLifecycle, CursorState, ExecutionError, ExecutionResult,
    QueryContext,
};
use crate::observability::Event;
use crate::row::{ColumnDef, ColumnType, Row, RowType, RowTypeKind, Schema, Value};
use crate::storage::StoreAdapter;

use super::Operator;

const NAME: &str = "Count";

/// Single-row count of a table
#[derive(Debug, Clone)]
pub struct Count {
    table_type: Arc<RowType>,
    output: Arc<RowType>,
}

impl Count {
    /// Count rows of `table_type`; the output row type is issued by `schema`
    pub fn new(schema: &mut Schema, table_type: Arc<RowType>) -> ExecutionResult<Self> {
        Self::check_table(&table_type)?;
        let output = schema.new_values_type(
            format!("count({})", table_type.name()),
            vec![ColumnDef::new("count", ColumnType::Int)],
        );
        Ok(Self { table_type, output })
    }

    /// Count rows of `table_type` into a previously issued values row type
    pub fn with_output(table_type: Arc<RowType>, output: Arc<RowType>) -> ExecutionResult<Self> {
        Self::check_table(&table_type)?;
        let single_int = output.kind() == RowTypeKind::Values
            && output.nfields() == 1
            && output.columns()[0].column_type == ColumnType::Int;
        if !single_int {
            return Err(ExecutionError::invalid_argument(
                NAME,
                format!("{} is not a single integer values row type", output),
            ));
        }
        Ok(Self { table_type, output })
    }

    fn check_table(table_type: &RowType) -> ExecutionResult<()> {
        if table_type.is_table() {
            Ok(())
        } else {
            Err(ExecutionError::invalid_argument(
                NAME,
                format!("{} is not a table row type", table_type),
            ))
        }
    }

    pub fn table_type(&self) -> &Arc<RowType> {
        &self.table_type
    }
}

impl Operator for Count {
    fn cursor(&self, adapter: &Arc<dyn StoreAdapter>, context: &QueryContext) -> ExecutionResult<BoxedCursor> {
        Ok(Box::new(CountCursor {
            lifecycle: CursorLifecycle::new(NAME),
            context: context.clone(),
            adapter: Arc::clone(adapter),
            table_type: Arc::clone(&self.table_type),
            output: Arc::clone(&self.output),
            pending: false,
        }))
    }

    fn row_type(&self) -> Arc<RowType> {
        Arc::clone(&self.output)
    }

    fn find_derived_types(&self, types: &mut HashSet<Arc<RowType>>) {
        types.insert(Arc::clone(&self.output));
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> String {
        format!("{}({})", NAME, self.table_type.name())
    }
}

struct CountCursor {
    lifecycle: CursorLifecycle,
    context: QueryContext,
    adapter: Arc<dyn StoreAdapter>,
    table_type: Arc<RowType>,
    output: Arc<RowType>,
    /// Set by `open`, cleared once the row is produced or on `close`
    pending: bool,
}

impl CountCursor {
    fn abort(&mut self, err: ExecutionError) -> ExecutionError {
        self.pending = false;
        self.lifecycle.deactivate();
        err.with_operator(NAME)
    }

    fn count_row(&self) -> ExecutionResult<Row> {
        let count = self.adapter.row_count(&self.table_type)?;
        self.context.metrics().increment_row_count_reads();
        Row::values_row(Arc::clone(&self.output), vec![Value::Int(count)])
    }
}

impl Cursor for CountCursor {
    fn open(&mut self, _bindings: &Bindings) -> ExecutionResult<()> {
        self.lifecycle.check_idle()?;
        self.pending = true;
        self.lifecycle.activate();
        self.context.metrics().increment_cursors_opened();
        self.context.trace(Event::CursorOpen, NAME, self.table_type.name());
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        self.lifecycle.check_active()?;
        if let Err(e) = self.context.check_cancellation() {
            return Err(self.abort(e));
        }
        if !self.pending {
            self.lifecycle.deactivate();
            self.context.trace(Event::EndOfStream, NAME, self.table_type.name());
            return Ok(None);
        }
        let row = match self.count_row() {
            Ok(row) => row,
            Err(e) => return Err(self.abort(e)),
        };
        self.pending = false;
        self.context.metrics().increment_rows_produced();
        if self.context.config().log_operator_execution {
            self.context.trace(Event::RowYield, NAME, &row.to_string());
        }
        Ok(Some(row))
    }

    fn close(&mut self) -> ExecutionResult<()> {
        self.lifecycle.check_idle_or_active()?;
        if self.lifecycle.is_active() {
            self.pending = false;
            self.lifecycle.deactivate();
            self.context.trace(Event::CursorClose, NAME, self.table_type.name());
        }
        Ok(())
    }

    fn destroy(&mut self) -> ExecutionResult<()> {
        self.lifecycle.destroy()?;
        self.pending = false;
        self.context.metrics().increment_cursors_destroyed();
        self.context.trace(Event::CursorDestroy, NAME, self.table_type.name());
        Ok(())
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::testing::Fixture;
    use crate::row::HKey;

    fn count_of(table_type: &Arc<RowType>) -> Count {
        let mut scratch = Schema::new();
        let output = scratch.new_values_type("count", vec![ColumnDef::new("count", ColumnType::Int)]);
        Count::with_output(Arc::clone(table_type), output).unwrap()
    }

    #[test]
    fn test_single_row_then_end_of_stream() {
        let f = Fixture::new();
        let count = count_of(&f.order);
        let mut cursor = count.cursor(&f.adapter, &f.context).unwrap();

        cursor.open(&Bindings::new(0)).unwrap();
        let row = cursor.next().unwrap().unwrap();
        assert_eq!(row.values(), &[Value::Int(3)]);
        assert!(cursor.is_active());
        assert!(cursor.next().unwrap().is_none());
        assert!(cursor.is_idle());
    }

    #[test]
    fn test_second_next_does_not_reread() {
        let f = Fixture::new();
        let count = count_of(&f.customer);
        let mut cursor = count.cursor(&f.adapter, &f.context).unwrap();

        cursor.open(&Bindings::new(0)).unwrap();
        assert_eq!(cursor.next().unwrap().unwrap().values(), &[Value::Int(3)]);

        let hkey = HKey::root(f.customer.table_id().unwrap(), vec![Value::Int(4)]);
        f.memory
            .write_row(Row::table_row(Arc::clone(&f.customer), hkey, vec![Value::Int(4)]).unwrap())
            .unwrap();

        assert!(cursor.next().unwrap().is_none());
        assert_eq!(f.context.metrics().snapshot().row_count_reads, 1);

        // A fresh open sees the new count
        cursor.open(&Bindings::new(0)).unwrap();
        assert_eq!(cursor.next().unwrap().unwrap().values(), &[Value::Int(4)]);
    }

    #[test]
    fn test_approximate_mode_reads_committed_count() {
        let f = Fixture::with_mode(crate::executor::RowCountMode::Approximate);
        let count = count_of(&f.order);
        let mut cursor = count.cursor(&f.adapter, &f.context).unwrap();
        let rows = crate::executor::collect_rows(cursor.as_mut(), &Bindings::new(0)).unwrap();
        assert_eq!(rows[0].values(), &[Value::Int(0)]);

        f.memory.commit().unwrap();
        let rows = crate::executor::collect_rows(cursor.as_mut(), &Bindings::new(0)).unwrap();
        assert_eq!(rows[0].values(), &[Value::Int(3)]);
    }

    #[test]
    fn test_close_clears_pending() {
        let f = Fixture::new();
        let count = count_of(&f.item);
        let mut cursor = count.cursor(&f.adapter, &f.context).unwrap();

        cursor.open(&Bindings::new(0)).unwrap();
        cursor.close().unwrap();
        assert!(cursor.is_idle());
        assert!(cursor.next().unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_rejects_non_table_type() {
        let mut schema = Schema::new();
        let values = schema.new_values_type("v", vec![ColumnDef::new("x", ColumnType::Int)]);
        let err = Count::new(&mut schema, values).unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(err.operator(), Some(NAME));
    }

    #[test]
    fn test_output_type_is_derived() {
        let mut schema = Schema::new();
        let t = schema
            .new_table("t", vec![ColumnDef::new("id", ColumnType::Int)], None)
            .unwrap();
        let count = Count::new(&mut schema, t).unwrap();

        let output = count.row_type();
        assert_eq!(output.columns()[0].name, "count");
        assert!(!output.is_table());
        assert!(crate::operator::derived_types(&count).contains(&output));
        assert_eq!(count.describe(), "Count(t)");
    }
}
