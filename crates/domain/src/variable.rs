//! Variable — a named integer shared between expressions.
//!
//! Variables are the only mutable state the expression language can
//! write to. They are provisioned through the store or API, never
//! auto-created by an expression.

use serde::{Deserialize, Serialize};

/// Default modulo for [`Variable::toggle`].
pub const DEFAULT_TOGGLE_MODULO: i64 = 2;

/// A named integer value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Unique variable name.
    pub name: String,
    /// Current value.
    pub value: i64,
}

impl Variable {
    /// Overwrite the value, returning the new value.
    pub fn set(&mut self, value: i64) -> i64 {
        self.value = value;
        self.value
    }

    /// Advance the value to `(value + 1) mod modulo`, returning the new
    /// value, or `None` when `modulo < 1`.
    ///
    /// Euclidean remainder, so values that start negative still cycle
    /// into `0..modulo`.
    pub fn toggle(&mut self, modulo: i64) -> Option<i64> {
        if modulo < 1 {
            return None;
        }
        self.value = (self.value + 1).rem_euclid(modulo);
        Some(self.value)
    }
}
