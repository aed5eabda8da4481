//! Execution error types
//!
//! Error codes:
//! - HKX_LIFECYCLE_VIOLATION (FATAL) - cursor call outside its lifecycle
//! - HKX_INVALID_ARGUMENT (FATAL) - operator or row construction rejected
//! - HKX_BINDING_UNSET / HKX_BINDING_OUT_OF_RANGE / HKX_BINDING_TYPE (FATAL)
//! - HKX_QUERY_CANCELED (ERROR) - the query's cancellation token was set
//! - HKX_STORAGE_FAILURE (ERROR) - storage adapter failure, passed through
//!
//! FATAL here means fatal to the current query, not to the process.

use std::fmt;

use crate::storage::StorageError;

use super::lifecycle::CursorState;

/// Severity levels for execution errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Query stops; caller may issue another
    Error,
    /// Programming error; the query cannot continue
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

impl From<Severity> for crate::observability::Severity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => crate::observability::Severity::Error,
            Severity::Fatal => crate::observability::Severity::Fatal,
        }
    }
}

/// Broad classification used by callers to decide what to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Wrong lifecycle call, bad binding, bad construction argument
    ContractViolation,
    /// Deliberate cancellation; not a failure
    Canceled,
    /// Failure reported by the storage adapter
    Storage,
}

/// Execution error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorCode {
    HkxLifecycleViolation,
    HkxInvalidArgument,
    HkxBindingUnset,
    HkxBindingOutOfRange,
    HkxBindingType,
    HkxQueryCanceled,
    HkxStorageFailure,
}

impl ExecutionErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionErrorCode::HkxLifecycleViolation => "HKX_LIFECYCLE_VIOLATION",
            ExecutionErrorCode::HkxInvalidArgument => "HKX_INVALID_ARGUMENT",
            ExecutionErrorCode::HkxBindingUnset => "HKX_BINDING_UNSET",
            ExecutionErrorCode::HkxBindingOutOfRange => "HKX_BINDING_OUT_OF_RANGE",
            ExecutionErrorCode::HkxBindingType => "HKX_BINDING_TYPE",
            ExecutionErrorCode::HkxQueryCanceled => "HKX_QUERY_CANCELED",
            ExecutionErrorCode::HkxStorageFailure => "HKX_STORAGE_FAILURE",
        }
    }

    /// Returns the error class
    pub fn class(&self) -> ErrorClass {
        match self {
            ExecutionErrorCode::HkxQueryCanceled => ErrorClass::Canceled,
            ExecutionErrorCode::HkxStorageFailure => ErrorClass::Storage,
            _ => ErrorClass::ContractViolation,
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self.class() {
            ErrorClass::ContractViolation => Severity::Fatal,
            ErrorClass::Canceled | ErrorClass::Storage => Severity::Error,
        }
    }
}

impl fmt::Display for ExecutionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Execution error with operator context
#[derive(Debug)]
pub struct ExecutionError {
    code: ExecutionErrorCode,
    message: String,
    /// Operator the failure surfaced in, if known
    operator: Option<String>,
    source: Option<StorageError>,
}

impl ExecutionError {
    fn new(code: ExecutionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            operator: None,
            source: None,
        }
    }

    /// A cursor call made from a state that does not allow it
    pub fn lifecycle_violation(operator: &str, expected: &str, actual: CursorState) -> Self {
        Self::new(
            ExecutionErrorCode::HkxLifecycleViolation,
            format!("expected cursor {}, but it is {}", expected, actual),
        )
        .with_operator(operator)
    }

    /// Construction-time argument rejected
    pub fn invalid_argument(operator: &str, reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorCode::HkxInvalidArgument, reason).with_operator(operator)
    }

    /// Binding slot read before it was written
    pub fn binding_unset(slot: usize) -> Self {
        Self::new(
            ExecutionErrorCode::HkxBindingUnset,
            format!("binding slot {} read before being written", slot),
        )
    }

    /// Binding slot outside the reserved range
    pub fn binding_out_of_range(slot: usize, reserved: usize) -> Self {
        Self::new(
            ExecutionErrorCode::HkxBindingOutOfRange,
            format!("binding slot {} outside reserved range 0..{}", slot, reserved),
        )
    }

    /// Binding slot holds a value of the wrong kind
    pub fn binding_type(slot: usize, expected: &str, actual: &str) -> Self {
        Self::new(
            ExecutionErrorCode::HkxBindingType,
            format!("binding slot {} holds {}, expected {}", slot, actual, expected),
        )
    }

    /// The query was canceled
    pub fn query_canceled(query_id: impl fmt::Display) -> Self {
        Self::new(
            ExecutionErrorCode::HkxQueryCanceled,
            format!("query {} canceled", query_id),
        )
    }

    /// Storage adapter failure, kept as the source
    pub fn storage(source: StorageError) -> Self {
        Self {
            code: ExecutionErrorCode::HkxStorageFailure,
            message: source.message().to_string(),
            operator: None,
            source: Some(source),
        }
    }

    /// Attach operator context unless some is already present
    pub fn with_operator(mut self, operator: &str) -> Self {
        if self.operator.is_none() {
            self.operator = Some(operator.to_string());
        }
        self
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutionErrorCode {
        self.code
    }

    /// Returns the error class
    pub fn class(&self) -> ErrorClass {
        self.code.class()
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the operator context, if any
    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    /// Returns the wrapped storage error, if any
    pub fn storage_error(&self) -> Option<&StorageError> {
        self.source.as_ref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub fn is_cancellation(&self) -> bool {
        self.class() == ErrorClass::Canceled
    }

    pub fn is_contract_violation(&self) -> bool {
        self.class() == ErrorClass::ContractViolation
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref operator) = self.operator {
            write!(f, " (operator: {})", operator)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<StorageError> for ExecutionError {
    fn from(e: StorageError) -> Self {
        Self::storage(e)
    }
}

/// Result type for execution operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;
