//! Capability scopes the interpreter evaluates against.
//!
//! Each namespace root is backed by a trait with a fixed method set, so
//! the store-backed implementations and test doubles are injected
//! through the same narrow interface.

use super::error::EvalError;

/// Backing for the `variable` root.
pub trait VariableScope {
    /// Current value of a variable.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownVariable`] for unprovisioned names.
    fn get(&mut self, name: &str) -> Result<i64, EvalError>;

    /// Overwrite a variable, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownVariable`] for unprovisioned names.
    fn set(&mut self, name: &str, value: i64) -> Result<i64, EvalError>;

    /// Advance a variable to `(value + 1) mod modulo`, returning the
    /// new value.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownVariable`] for unprovisioned names
    /// or [`EvalError::InvalidModulo`] when `modulo < 1`.
    fn toggle(&mut self, name: &str, modulo: i64) -> Result<i64, EvalError>;
}

/// Backing for the `device` root.
pub trait DeviceScope {
    /// Whether the named device reported within the heartbeat timeout.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownDevice`] for unknown names.
    fn is_alive(&mut self, name: &str) -> Result<bool, EvalError>;

    /// Number of alive devices.
    fn count_alive(&mut self) -> i64;

    /// Number of dead devices.
    fn count_dead(&mut self) -> i64;
}

/// Backing for the `log` root, available during trigger execution.
pub trait LogScope {
    /// Append an info entry to the audit trail.
    fn log(&mut self, message: &str);
}

/// The triggering pin record bound as `pin` during trigger execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEvent {
    /// Device the edge came from.
    pub device: String,
    /// Input pin that saw the edge.
    pub pin: String,
    /// The pin's new level.
    pub level: bool,
}

/// The complete set of names an expression can see.
pub struct Namespace<'a> {
    pub variables: &'a mut dyn VariableScope,
    pub devices: &'a mut dyn DeviceScope,
    /// Bound only during trigger execution.
    pub pin: Option<&'a PinEvent>,
    /// Bound only during trigger execution.
    pub log: Option<&'a mut dyn LogScope>,
}

impl<'a> Namespace<'a> {
    /// Namespace for intended-state evaluation: no `pin`, no `log`.
    pub fn new(
        variables: &'a mut dyn VariableScope,
        devices: &'a mut dyn DeviceScope,
    ) -> Self {
        Self {
            variables,
            devices,
            pin: None,
            log: None,
        }
    }

    /// Namespace for trigger execution, with `pin` and `log` bound.
    pub fn for_trigger(
        variables: &'a mut dyn VariableScope,
        devices: &'a mut dyn DeviceScope,
        pin: &'a PinEvent,
        log: &'a mut dyn LogScope,
    ) -> Self {
        Self {
            variables,
            devices,
            pin: Some(pin),
            log: Some(log),
        }
    }
}
