//! The expression language driving intended states and triggers.
//!
//! A deliberately small language: integer/boolean/string literals,
//! arithmetic, comparisons, `and`/`or`/`not`, and method calls on four
//! bound names (`variable`, `device`, `pin`, `log`). Nothing else
//! resolves — the parser rejects unknown names, which is the sandbox
//! boundary. Programs are one or more expressions separated by `;`; the
//! value of the last expression is the program's value.
//!
//! Evaluation walks the AST against a [`Namespace`] of capability
//! traits, so the same interpreter runs over the live store-backed
//! scopes and over plain in-memory test doubles.
//!
//! ```
//! use pinhub_domain::expr::Program;
//!
//! let program = Program::parse("variable.get('mode') == 1").unwrap();
//! ```

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod scope;
mod value;

pub use ast::{BinaryOp, Expr, Program, Root, UnaryOp};
pub use error::{EvalError, ParseError};
pub use scope::{DeviceScope, LogScope, Namespace, PinEvent, VariableScope};
pub use value::Value;
