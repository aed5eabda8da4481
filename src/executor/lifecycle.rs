//! Cursor lifecycle state machine
//!
//! ```text
//!   IDLE --open--> ACTIVE --end of stream / close--> IDLE
//!   IDLE | ACTIVE --destroy--> DESTROYED (terminal)
//! ```
//!
//! Every cursor holds one `CursorLifecycle` and routes its checks through
//! it, so the rules live in exactly one place.

use std::fmt;

use super::errors::{ExecutionError, ExecutionResult};

/// Lifecycle state of a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Idle,
    Active,
    Destroyed,
}

impl CursorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CursorState::Idle => "IDLE",
            CursorState::Active => "ACTIVE",
            CursorState::Destroyed => "DESTROYED",
        }
    }
}

impl fmt::Display for CursorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state plus the checks that guard each cursor call.
#[derive(Debug, Clone)]
pub struct CursorLifecycle {
    operator: &'static str,
    state: CursorState,
}

impl CursorLifecycle {
    /// New lifecycle in `IDLE`
    pub fn new(operator: &'static str) -> Self {
        Self {
            operator,
            state: CursorState::Idle,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn operator(&self) -> &'static str {
        self.operator
    }

    pub fn is_idle(&self) -> bool {
        self.state == CursorState::Idle
    }

    pub fn is_active(&self) -> bool {
        self.state == CursorState::Active
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == CursorState::Destroyed
    }

    /// Guard for `open`
    pub fn check_idle(&self) -> ExecutionResult<()> {
        self.require(self.is_idle(), "IDLE")
    }

    /// Guard for `next`
    pub fn check_active(&self) -> ExecutionResult<()> {
        self.require(self.is_active(), "ACTIVE")
    }

    /// Guard for `close`
    pub fn check_idle_or_active(&self) -> ExecutionResult<()> {
        self.require(!self.is_destroyed(), "IDLE or ACTIVE")
    }

    /// `open` succeeded
    pub fn activate(&mut self) {
        self.state = CursorState::Active;
    }

    /// End of stream or `close`
    pub fn deactivate(&mut self) {
        if self.state == CursorState::Active {
            self.state = CursorState::Idle;
        }
    }

    /// Transition to `DESTROYED`; fails if already there
    pub fn destroy(&mut self) -> ExecutionResult<()> {
        self.check_idle_or_active()?;
        self.state = CursorState::Destroyed;
        Ok(())
    }

    fn require(&self, ok: bool, expected: &str) -> ExecutionResult<()> {
        if ok {
            Ok(())
        } else {
            Err(ExecutionError::lifecycle_violation(
                self.operator,
                expected,
                self.state,
            ))
        }
    }
}
