//! Row limits for group scans
//!
//! A `Limit` is part of the immutable operator; the counting lives in a
//! `LimitState` owned by each cursor and reset on every `open`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::row::{Row, TableId};

/// Limit policy tested against every row a scan produces
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Limit {
    #[default]
    NoLimit,
    /// At most this many rows in total
    RowLimit(u64),
    /// At most this many rows per listed table; other tables are unlimited
    PerTableRowLimit(BTreeMap<TableId, u64>),
}

impl Limit {
    pub fn rows(max: u64) -> Self {
        Limit::RowLimit(max)
    }

    pub fn per_table(caps: impl IntoIterator<Item = (TableId, u64)>) -> Self {
        Limit::PerTableRowLimit(caps.into_iter().collect())
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Limit::NoLimit)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::NoLimit => write!(f, "NoLimit"),
            Limit::RowLimit(max) => write!(f, "RowLimit({})", max),
            Limit::PerTableRowLimit(caps) => {
                write!(f, "PerTableRowLimit(")?;
                for (i, (table_id, max)) in caps.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "t{}: {}", table_id, max)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Per-cursor counters for a `Limit`
#[derive(Debug, Default)]
pub struct LimitState {
    total: u64,
    per_table: HashMap<TableId, u64>,
}

impl LimitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.total = 0;
        self.per_table.clear();
    }

    /// Count `row` and report whether it exceeds `limit`.
    ///
    /// A row for which this returns true must not be yielded.
    pub fn reached(&mut self, limit: &Limit, row: &Row) -> bool {
        match limit {
            Limit::NoLimit => false,
            Limit::RowLimit(max) => {
                self.total += 1;
                self.total > *max
            }
            Limit::PerTableRowLimit(caps) => {
                let Some(table_id) = row.row_type().table_id() else {
                    return false;
                };
                let Some(max) = caps.get(&table_id) else {
                    return false;
                };
                let seen = self.per_table.entry(table_id).or_insert(0);
                *seen += 1;
                *seen > *max
            }
        }
    }
}
