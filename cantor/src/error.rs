use thiserror::Error;

use crate::countability::Countability;

/// A structurally invalid set construction.
///
/// Fatal to the construction call only; the surrounding statement reports it
/// and the session continues.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TypeConstructionError {
    #[error("power arity must be non-negative, got {0}")]
    NegativePower(i64),
    #[error("tuple must have at least one component")]
    EmptyTuple,
    #[error("unknown type name '{0}'")]
    UnknownName(String),
}

/// Raised by [`enumerate`](crate::enumerate::enumerate) when the set is not
/// classified [`Countability::Countable`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot enumerate '{set}': classified {classification:?}")]
pub struct NotCountableError {
    /// Display form of the offending set expression.
    pub set: String,
    pub classification: Countability,
}

/// A builtin function without an entry in the derivative table.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("no derivative rule for '{0}'")]
pub struct UnsupportedDerivativeError(pub String);

/// Failure while evaluating a [`SymbolicExpr`](crate::symbolic::SymbolicExpr)
/// against concrete bindings.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("variable '{0}' is not bound")]
    Unbound(String),
    #[error("cannot apply '{op}' to {operand}")]
    InvalidOperand { op: String, operand: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("cannot raise zero to the power of zero")]
    ZeroToZero,
    #[error("exponent is too large to compute")]
    ExponentTooLarge,
    #[error("unknown builtin '{0}'")]
    UnknownBuiltin(String),
    #[error("'{name}' expects {expected} arguments, got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("'{0}' has no exact value here")]
    Inexact(String),
    #[error("'{0}' is not callable")]
    NotCallable(String),
}

/// A failed bind. Both variants are recoverable diagnostics at the statement
/// level, never fatal to the session.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BindError {
    /// The oracle answered `False`: the value is provably outside the typeset.
    #[error("type mismatch: '{value}' is not in '{typeset}'")]
    Mismatch { value: String, typeset: String },
    /// The oracle answered `Unknown` under the rejecting policy.
    #[error("cannot decide whether '{value}' is in '{typeset}'")]
    Undecided { value: String, typeset: String },
}
