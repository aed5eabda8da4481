//! Rows produced by cursors

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};

use crate::executor::{ExecutionError, ExecutionResult};

use super::hkey::HKey;
use super::row_type::RowType;
use super::value::Value;

/// A fixed-arity sequence of values of one row type.
///
/// Table rows carry their hkey; values rows (computed by operators) do not.
/// Rows are owned values: a cursor hands out a fresh `Row` from each `next`
/// and never mutates it afterwards, so callers may keep rows across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    row_type: Arc<RowType>,
    hkey: Option<HKey>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row stored in a group table
    pub fn table_row(row_type: Arc<RowType>, hkey: HKey, values: Vec<Value>) -> ExecutionResult<Self> {
        if !row_type.is_table() {
            return Err(ExecutionError::invalid_argument(
                "Row",
                format!("{} is not a table row type", row_type),
            ));
        }
        if hkey.table_id() != row_type.table_id() {
            return Err(ExecutionError::invalid_argument(
                "Row",
                format!("hkey {} does not identify a row of {}", hkey, row_type),
            ));
        }
        Self::checked(row_type, Some(hkey), values)
    }

    /// Build a computed row
    pub fn values_row(row_type: Arc<RowType>, values: Vec<Value>) -> ExecutionResult<Self> {
        Self::checked(row_type, None, values)
    }

    fn checked(row_type: Arc<RowType>, hkey: Option<HKey>, values: Vec<Value>) -> ExecutionResult<Self> {
        if values.len() != row_type.nfields() {
            return Err(ExecutionError::invalid_argument(
                "Row",
                format!(
                    "{} expects {} fields, got {}",
                    row_type,
                    row_type.nfields(),
                    values.len()
                ),
            ));
        }
        Ok(Self {
            row_type,
            hkey,
            values,
        })
    }

    pub fn row_type(&self) -> &Arc<RowType> {
        &self.row_type
    }

    pub fn hkey(&self) -> Option<&HKey> {
        self.hkey.as_ref()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Field by position
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// JSON object keyed by column name, plus `_type` and (for table rows) `_hkey`
    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::new();
        object.insert("_type".to_string(), json!(self.row_type.name()));
        if let Some(hkey) = &self.hkey {
            object.insert("_hkey".to_string(), json!(hkey.to_string()));
        }
        for (column, value) in self.row_type.columns().iter().zip(&self.values) {
            object.insert(
                column.name.clone(),
                serde_json::to_value(value).unwrap_or(JsonValue::Null),
            );
        }
        JsonValue::Object(object)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.row_type.name())?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")?;
        if let Some(hkey) = &self.hkey {
            write!(f, " @ {}", hkey)?;
        }
        Ok(())
    }
}
