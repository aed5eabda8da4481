//! Binding environment
//!
//! Positional slots carrying values from an outer execution context into
//! an inner one, e.g. the hkey of the current outer row for a positional
//! group scan. The number of slots is fixed when the environment is built
//! from a plan; nothing grows at execution time.

use std::fmt;

use crate::operator::Operator;
use crate::row::{HKey, Value};

use super::errors::{ExecutionError, ExecutionResult};

/// A value stored in a binding slot
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    HKey(HKey),
    Scalar(Value),
}

impl BoundValue {
    /// Kind name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            BoundValue::HKey(_) => "hkey",
            BoundValue::Scalar(_) => "scalar",
        }
    }
}

impl From<HKey> for BoundValue {
    fn from(hkey: HKey) -> Self {
        BoundValue::HKey(hkey)
    }
}

impl From<Value> for BoundValue {
    fn from(value: Value) -> Self {
        BoundValue::Scalar(value)
    }
}

/// Fixed-size slot store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    slots: Vec<Option<BoundValue>>,
}

impl Bindings {
    /// Environment with `reserved` empty slots
    pub fn new(reserved: usize) -> Self {
        Self {
            slots: vec![None; reserved],
        }
    }

    /// Environment sized for everything `plan` reads or writes
    pub fn for_plan(plan: &dyn Operator) -> Self {
        Self::new(plan.binding_slots())
    }

    /// Number of reserved slots
    pub fn reserved(&self) -> usize {
        self.slots.len()
    }

    /// Write a slot; the slot must be within the reserved range
    pub fn set(&mut self, slot: usize, value: impl Into<BoundValue>) -> ExecutionResult<()> {
        let reserved = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| ExecutionError::binding_out_of_range(slot, reserved))?;
        *entry = Some(value.into());
        Ok(())
    }

    /// Read a slot that was written earlier
    pub fn get(&self, slot: usize) -> ExecutionResult<&BoundValue> {
        match self.slots.get(slot) {
            None => Err(ExecutionError::binding_out_of_range(slot, self.slots.len())),
            Some(None) => Err(ExecutionError::binding_unset(slot)),
            Some(Some(value)) => Ok(value),
        }
    }

    /// Read a slot that must hold an hkey
    pub fn get_hkey(&self, slot: usize) -> ExecutionResult<&HKey> {
        match self.get(slot)? {
            BoundValue::HKey(hkey) => Ok(hkey),
            other => Err(ExecutionError::binding_type(slot, "hkey", other.kind())),
        }
    }

    /// Read a slot that must hold a scalar
    pub fn get_scalar(&self, slot: usize) -> ExecutionResult<&Value> {
        match self.get(slot)? {
            BoundValue::Scalar(value) => Ok(value),
            other => Err(ExecutionError::binding_type(slot, "scalar", other.kind())),
        }
    }

    /// Whether a slot currently holds a value
    pub fn is_set(&self, slot: usize) -> bool {
        matches!(self.slots.get(slot), Some(Some(_)))
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bindings(")?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match slot {
                None => write!(f, "{}: -", i)?,
                Some(BoundValue::HKey(hkey)) => write!(f, "{}: {}", i, hkey)?,
                Some(BoundValue::Scalar(value)) => write!(f, "{}: {}", i, value)?,
            }
        }
        write!(f, ")")
    }
}
