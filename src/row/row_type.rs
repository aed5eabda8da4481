//! Row types and the schema that issues them
//!
//! A `RowType` is immutable once issued and shared through `Arc`. Table row
//! types know their table, parent table and group; values row types are
//! synthetic (produced by computed operators such as Count).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::executor::{ExecutionError, ExecutionResult};

/// Identity of a user table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct TableId(u32);

impl TableId {
    /// Creates a table id
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying value
    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a group table (a root table plus all its descendants).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct GroupId(u32);

impl GroupId {
    /// Creates a group id
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying value
    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Column value types understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Text,
    Bool,
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Where a table sits in its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableInfo {
    pub table_id: TableId,
    pub parent: Option<TableId>,
    pub group_id: GroupId,
}

/// Classification of a row type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowTypeKind {
    /// Rows stored in a group table
    Table(TableInfo),
    /// Any row of a group table (the output of a group scan)
    Group(GroupId),
    /// Synthetic rows computed by an operator
    Values,
}

/// Immutable schema descriptor for a stream of rows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowType {
    type_id: u32,
    name: String,
    columns: Vec<ColumnDef>,
    kind: RowTypeKind,
}

impl RowType {
    /// Schema-unique type id
    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Number of fields in rows of this type
    pub fn nfields(&self) -> usize {
        self.columns.len()
    }

    pub fn kind(&self) -> RowTypeKind {
        self.kind
    }

    pub fn is_table(&self) -> bool {
        matches!(self.kind, RowTypeKind::Table(_))
    }

    /// Table placement, for table row types only
    pub fn table_info(&self) -> Option<TableInfo> {
        match self.kind {
            RowTypeKind::Table(info) => Some(info),
            RowTypeKind::Group(_) | RowTypeKind::Values => None,
        }
    }

    pub fn table_id(&self) -> Option<TableId> {
        self.table_info().map(|info| info.table_id)
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RowTypeKind::Table(info) => write!(f, "{}(t{})", self.name, info.table_id.value()),
            RowTypeKind::Group(group_id) => write!(f, "{}(g{})", self.name, group_id.value()),
            RowTypeKind::Values => write!(f, "values{}({})", self.type_id, self.name),
        }
    }
}

/// The physical storage unit: a root table and all descendant tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTable {
    id: GroupId,
    name: String,
    root: TableId,
    tables: Vec<TableId>,
    row_type: Arc<RowType>,
}

impl GroupTable {
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> TableId {
        self.root
    }

    /// Member tables in registration order, root first
    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }

    pub fn contains(&self, table_id: TableId) -> bool {
        self.tables.contains(&table_id)
    }

    /// Row type of a scan over the whole group
    pub fn row_type(&self) -> &Arc<RowType> {
        &self.row_type
    }
}

/// Issues row types and tracks group membership.
///
/// Built up front by whoever plans queries; shared read-only afterwards.
#[derive(Debug, Default)]
pub struct Schema {
    next_type_id: u32,
    next_table_id: u32,
    next_group_id: u32,
    tables: BTreeMap<TableId, Arc<RowType>>,
    groups: BTreeMap<GroupId, GroupTable>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table. Without a parent it becomes the root of a new group;
    /// otherwise it joins the parent's group.
    pub fn new_table(
        &mut self,
        name: impl Into<String>,
        columns: Vec<ColumnDef>,
        parent: Option<TableId>,
    ) -> ExecutionResult<Arc<RowType>> {
        let name = name.into();
        if self.table_by_name(&name).is_some() {
            return Err(ExecutionError::invalid_argument(
                "Schema",
                format!("table '{}' already exists", name),
            ));
        }

        self.next_table_id += 1;
        let table_id = TableId::new(self.next_table_id);

        let group_id = match parent {
            Some(parent_id) => {
                let parent_type = self.tables.get(&parent_id).ok_or_else(|| {
                    ExecutionError::invalid_argument(
                        "Schema",
                        format!("unknown parent table {}", parent_id.value()),
                    )
                })?;
                let group_id = parent_type
                    .table_info()
                    .map(|info| info.group_id)
                    .ok_or_else(|| {
                        ExecutionError::invalid_argument("Schema", "parent is not a table")
                    })?;
                if let Some(group) = self.groups.get_mut(&group_id) {
                    group.tables.push(table_id);
                }
                group_id
            }
            None => {
                self.next_group_id += 1;
                let group_id = GroupId::new(self.next_group_id);
                let group_name = format!("{}_group", name);
                let row_type = Arc::new(RowType {
                    type_id: self.issue_type_id(),
                    name: group_name.clone(),
                    columns: Vec::new(),
                    kind: RowTypeKind::Group(group_id),
                });
                self.groups.insert(
                    group_id,
                    GroupTable {
                        id: group_id,
                        name: group_name,
                        root: table_id,
                        tables: vec![table_id],
                        row_type,
                    },
                );
                group_id
            }
        };

        let row_type = Arc::new(RowType {
            type_id: self.issue_type_id(),
            name,
            columns,
            kind: RowTypeKind::Table(TableInfo {
                table_id,
                parent,
                group_id,
            }),
        });
        self.tables.insert(table_id, Arc::clone(&row_type));
        Ok(row_type)
    }

    /// Issue a synthetic row type for computed rows
    pub fn new_values_type(&mut self, name: impl Into<String>, columns: Vec<ColumnDef>) -> Arc<RowType> {
        Arc::new(RowType {
            type_id: self.issue_type_id(),
            name: name.into(),
            columns,
            kind: RowTypeKind::Values,
        })
    }

    pub fn table(&self, table_id: TableId) -> Option<&Arc<RowType>> {
        self.tables.get(&table_id)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Arc<RowType>> {
        self.tables.values().find(|t| t.name() == name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<RowType>> {
        self.tables.values()
    }

    pub fn group(&self, group_id: GroupId) -> Option<&GroupTable> {
        self.groups.get(&group_id)
    }

    /// Group a table belongs to
    pub fn group_of(&self, table_id: TableId) -> Option<&GroupTable> {
        self.tables
            .get(&table_id)
            .and_then(|t| t.table_info())
            .and_then(|info| self.groups.get(&info.group_id))
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupTable> {
        self.groups.values()
    }

    fn issue_type_id(&mut self) -> u32 {
        self.next_type_id += 1;
        self.next_type_id
    }
}
