//! Parse and evaluation errors.
//!
//! Either kind fails only the single pin or trigger being evaluated;
//! the pipeline catches it, logs it, and moves on.

/// The expression text could not be tokenized or parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("integer literal out of range")]
    IntOutOfRange,

    #[error("empty expression")]
    Empty,

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),

    /// The sandbox boundary: only the bound namespace roots resolve.
    #[error("unknown name {0:?}")]
    UnknownName(String),
}

/// The expression parsed but failed while running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("unknown variable {0:?}")]
    UnknownVariable(String),

    #[error("unknown device {0:?}")]
    UnknownDevice(String),

    #[error("unknown method {root}.{method}")]
    UnknownMethod { root: &'static str, method: String },

    #[error("unknown property {root}.{name}")]
    UnknownProperty { root: &'static str, name: String },

    #[error("{method} expects {expected} argument(s), got {found}")]
    Arity {
        method: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("type mismatch: expected {expected}, got {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("toggle modulo must be positive")]
    InvalidModulo,

    #[error("{root:?} is only available while a trigger is firing")]
    OutsideTrigger { root: &'static str },
}
