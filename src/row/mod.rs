//! Row and hkey model
//!
//! Tables are stored in groups: a root table and all its descendants share
//! one physical group table, ordered by hkey. This module holds the types
//! the execution engine reasons about; encoding is left to storage.

mod hkey;
#[allow(clippy::module_inception)]
mod row;
mod row_type;
mod value;

pub use hkey::{HKey, HKeySegment};
pub use row::Row;
pub use row_type::{
    ColumnDef, ColumnType, GroupId, GroupTable, RowType, RowTypeKind, Schema, TableId, TableInfo,
};
pub use value::Value;
