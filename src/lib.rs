//! hkeyexec - cursor execution over hierarchical group tables
//!
//! Operators form immutable plan trees; cursors drive them through a
//! strict open / next / close / destroy lifecycle. Rows live in group
//! tables ordered by hkey, so a parent and its descendants are contiguous.

pub mod cli;
pub mod executor;
pub mod observability;
pub mod operator;
pub mod row;
pub mod storage;
