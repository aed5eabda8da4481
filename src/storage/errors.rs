//! Storage adapter error types
//!
//! Error codes:
//! - HKX_STORAGE_IO_ERROR - underlying I/O failure
//! - HKX_STORAGE_UNKNOWN_GROUP - no such group table
//! - HKX_STORAGE_UNKNOWN_TABLE - no such table / no table status
//! - HKX_STORAGE_DUPLICATE_KEY - a row with this hkey already exists
//! - HKX_STORAGE_LOCK_POISONED - shared state lock poisoned by a panic
//!
//! The execution layer passes these through unchanged; it never retries.

use std::fmt;
use std::io;

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    HkxStorageIoError,
    HkxStorageUnknownGroup,
    HkxStorageUnknownTable,
    HkxStorageDuplicateKey,
    HkxStorageLockPoisoned,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::HkxStorageIoError => "HKX_STORAGE_IO_ERROR",
            StorageErrorCode::HkxStorageUnknownGroup => "HKX_STORAGE_UNKNOWN_GROUP",
            StorageErrorCode::HkxStorageUnknownTable => "HKX_STORAGE_UNKNOWN_TABLE",
            StorageErrorCode::HkxStorageDuplicateKey => "HKX_STORAGE_DUPLICATE_KEY",
            StorageErrorCode::HkxStorageLockPoisoned => "HKX_STORAGE_LOCK_POISONED",
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl StorageError {
    fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// I/O failure from the backing store
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::HkxStorageIoError,
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn unknown_group(group_id: u32) -> Self {
        Self::new(
            StorageErrorCode::HkxStorageUnknownGroup,
            format!("unknown group table {}", group_id),
        )
    }

    pub fn unknown_table(table_id: u32) -> Self {
        Self::new(
            StorageErrorCode::HkxStorageUnknownTable,
            format!("no table status for table {}", table_id),
        )
    }

    pub fn duplicate_key(hkey: impl fmt::Display) -> Self {
        Self::new(
            StorageErrorCode::HkxStorageDuplicateKey,
            format!("row with hkey {} already exists", hkey),
        )
    }

    pub fn lock_poisoned(what: &str) -> Self {
        Self::new(
            StorageErrorCode::HkxStorageLockPoisoned,
            format!("{} lock poisoned", what),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
