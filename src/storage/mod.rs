//! Storage subsystem
//!
//! The execution layer sees storage only through [`StoreAdapter`] and
//! [`GroupCursor`]. This module also owns per-table counters (row counts,
//! auto-increment, unique ids) and the session that buffers row-count
//! changes until commit.
//!
//! # Design Principles
//!
//! - Group tables are scanned in hkey order; a descendant range is contiguous
//! - Exact row counts include the reading session's own uncommitted changes
//! - Approximate row counts never wait on writers
//! - Unique ids never repeat, even across concurrent sessions
//! - Storage errors reach the caller unchanged

mod adapter;
mod errors;
mod memory;
mod session;
mod status_cache;
mod table_status;

pub use adapter::{BoxedGroupCursor, GroupCursor, StoreAdapter};
pub use errors::{StorageError, StorageErrorCode, StorageResult};
pub use memory::MemoryStoreAdapter;
pub use session::{PendingRowCount, Session};
pub use status_cache::TableStatusCache;
pub use table_status::{MemoryTableFactory, MemoryTableStatus, StoredTableStatus, TableStatus};
