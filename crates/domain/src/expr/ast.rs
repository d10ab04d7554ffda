//! Abstract syntax tree of the expression language.

/// One of the four bound namespace roots.
///
/// Resolved at parse time; any other name is rejected there, so an AST
/// can never reference ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    Variable,
    Device,
    Pin,
    Log,
}

impl Root {
    pub(super) fn from_name(name: &str) -> Option<Self> {
        match name {
            "variable" => Some(Self::Variable),
            "device" => Some(Self::Device),
            "pin" => Some(Self::Pin),
            "log" => Some(Self::Log),
            _ => None,
        }
    }

    /// The root's name as written in source.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Device => "device",
            Self::Pin => "pin",
            Self::Log => "log",
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Integer negation.
    Neg,
    /// Boolean `not`.
    Not,
}

/// Infix operators, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// One expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(super::Value),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `pin.value` and friends.
    Property { root: Root, name: String },
    /// `variable.get('mode')` and friends.
    Call {
        root: Root,
        method: String,
        args: Vec<Expr>,
    },
}

/// A parsed program: expressions separated by `;`, evaluating to the
/// value of the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub(super) exprs: Vec<Expr>,
}
