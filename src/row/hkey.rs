//! Hierarchical keys
//!
//! An hkey names a row's position inside its group: one segment per
//! ancestor level, from the group root down to the row's own table.
//!
//! Ordering is lexicographic over segments, and a prefix sorts before every
//! extension of it. Consequently a row is immediately followed by its whole
//! subtree, which is what deep positional scans rely on.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::row_type::TableId;
use super::value::Value;

/// One level of an hkey: the table at that level and its key values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HKeySegment {
    table_id: TableId,
    values: Vec<Value>,
}

impl HKeySegment {
    /// Create a segment
    pub fn new(table_id: TableId, values: Vec<Value>) -> Self {
        Self { table_id, values }
    }

    /// Table identified by this segment
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Key column values of this segment
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// A hierarchical key.
///
/// `PartialOrd`/`Ord` are derived from the segment vector, which gives
/// exactly the lexicographic, prefix-first order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HKey {
    segments: Vec<HKeySegment>,
}

impl HKey {
    /// Create an hkey from its segments, root first
    pub fn new(segments: Vec<HKeySegment>) -> Self {
        Self { segments }
    }

    /// Hkey of a group root row
    pub fn root(table_id: TableId, values: Vec<Value>) -> Self {
        Self {
            segments: vec![HKeySegment::new(table_id, values)],
        }
    }

    /// Hkey of a child row of `self`
    pub fn child(&self, table_id: TableId, values: Vec<Value>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(HKeySegment::new(table_id, values));
        Self { segments }
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Segments, root first
    pub fn segments(&self) -> &[HKeySegment] {
        &self.segments
    }

    /// Table of the row this hkey identifies; `None` for the empty hkey
    pub fn table_id(&self) -> Option<TableId> {
        self.segments.last().map(|s| s.table_id)
    }

    /// Immediate parent (prefix at depth - 1); `None` for roots
    pub fn parent(&self) -> Option<HKey> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Strict ancestor test: `self` is a proper prefix of `other`
    pub fn is_ancestor_of(&self, other: &HKey) -> bool {
        self.segments.len() < other.segments.len() && self.is_prefix_of(other)
    }

    /// `self` equals `other` or is an ancestor of it
    pub fn is_prefix_of(&self, other: &HKey) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for HKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "({})", segment.table_id.value())?;
            for value in &segment.values {
                write!(f, "{}", value)?;
            }
        }
        write!(f, "}}")
    }
}
