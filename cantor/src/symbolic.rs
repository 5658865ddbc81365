use std::fmt;
use std::sync::Arc;

use derive_more::Display;

use crate::value::Number;

mod diff;
mod eval;

pub use diff::differentiate;
pub use eval::{eval, Bindings};

/// An algebraic expression tree.
///
/// Immutable; transformations such as differentiation always build a new
/// tree. Subtrees are shared through [`Arc`], so rules that reuse an operand
/// on both sides of a product never copy it.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum SymbolicExpr {
    Const(Number),
    Var(String),
    Binary {
        op: BinaryOp,
        lhs: Arc<SymbolicExpr>,
        rhs: Arc<SymbolicExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Arc<SymbolicExpr>,
    },
    /// Application of a named builtin function.
    Call(String, Vec<Arc<SymbolicExpr>>),
    /// A symbolic reference to a user function for point-free composition;
    /// `f^2` reads as `f(x)^2` over the ambient variable.
    FuncRef(String),
}

#[derive(Clone, Copy, Debug, Display, Hash, PartialEq, Eq)]
pub enum BinaryOp {
    #[display(fmt = "+")]
    Add,
    #[display(fmt = "-")]
    Sub,
    #[display(fmt = "*")]
    Mul,
    #[display(fmt = "/")]
    Div,
    #[display(fmt = "^")]
    Pow,
}

#[derive(Clone, Copy, Debug, Display, Hash, PartialEq, Eq)]
pub enum UnaryOp {
    #[display(fmt = "-")]
    Neg,
    #[display(fmt = "conj")]
    Conj,
}

pub fn constant(value: Number) -> Arc<SymbolicExpr> {
    Arc::new(SymbolicExpr::Const(value))
}

pub fn int(value: i64) -> Arc<SymbolicExpr> {
    constant(Number::from(value))
}

pub fn var(name: impl Into<String>) -> Arc<SymbolicExpr> {
    Arc::new(SymbolicExpr::Var(name.into()))
}

pub fn call(name: impl Into<String>, args: Vec<Arc<SymbolicExpr>>) -> Arc<SymbolicExpr> {
    Arc::new(SymbolicExpr::Call(name.into(), args))
}

pub fn func_ref(name: impl Into<String>) -> Arc<SymbolicExpr> {
    Arc::new(SymbolicExpr::FuncRef(name.into()))
}

impl SymbolicExpr {
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Const(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Self::Const(n) if *n == Number::one())
    }

    pub fn as_const(&self) -> Option<&Number> {
        match self {
            Self::Const(n) => Some(n),
            _ => None,
        }
    }

    /// Whether the expression mentions `name` (a [`SymbolicExpr::FuncRef`]
    /// counts, since it implicitly applies to the ambient variable).
    pub fn depends_on(&self, name: &str) -> bool {
        match self {
            Self::Const(_) => false,
            Self::Var(v) => v == name,
            Self::Binary { lhs, rhs, .. } => lhs.depends_on(name) || rhs.depends_on(name),
            Self::Unary { operand, .. } => operand.depends_on(name),
            Self::Call(_, args) => args.iter().any(|arg| arg.depends_on(name)),
            Self::FuncRef(_) => true,
        }
    }
}

// Smart constructors used when building derived trees. They fold identity
// elements and exact constant addition/subtraction/multiplication so that
// e.g. the power rule yields `2 * x` rather than `2 * x^1 * 1`. This is not
// general simplification; only enough to keep results readable.

pub fn add(lhs: Arc<SymbolicExpr>, rhs: Arc<SymbolicExpr>) -> Arc<SymbolicExpr> {
    if lhs.is_zero() {
        return rhs;
    }
    if rhs.is_zero() {
        return lhs;
    }
    if let (Some(a), Some(b)) = (lhs.as_const(), rhs.as_const()) {
        return constant(a.add(b));
    }
    Arc::new(SymbolicExpr::Binary {
        op: BinaryOp::Add,
        lhs,
        rhs,
    })
}

pub fn sub(lhs: Arc<SymbolicExpr>, rhs: Arc<SymbolicExpr>) -> Arc<SymbolicExpr> {
    if rhs.is_zero() {
        return lhs;
    }
    if lhs.is_zero() {
        return neg(rhs);
    }
    if let (Some(a), Some(b)) = (lhs.as_const(), rhs.as_const()) {
        return constant(a.sub(b));
    }
    Arc::new(SymbolicExpr::Binary {
        op: BinaryOp::Sub,
        lhs,
        rhs,
    })
}

pub fn mul(lhs: Arc<SymbolicExpr>, rhs: Arc<SymbolicExpr>) -> Arc<SymbolicExpr> {
    if lhs.is_zero() || rhs.is_zero() {
        return int(0);
    }
    if lhs.is_one() {
        return rhs;
    }
    if rhs.is_one() {
        return lhs;
    }
    if let (Some(a), Some(b)) = (lhs.as_const(), rhs.as_const()) {
        return constant(a.mul(b));
    }
    Arc::new(SymbolicExpr::Binary {
        op: BinaryOp::Mul,
        lhs,
        rhs,
    })
}

pub fn div(lhs: Arc<SymbolicExpr>, rhs: Arc<SymbolicExpr>) -> Arc<SymbolicExpr> {
    if lhs.is_zero() || rhs.is_one() {
        return lhs;
    }
    Arc::new(SymbolicExpr::Binary {
        op: BinaryOp::Div,
        lhs,
        rhs,
    })
}

pub fn pow(lhs: Arc<SymbolicExpr>, rhs: Arc<SymbolicExpr>) -> Arc<SymbolicExpr> {
    if rhs.is_one() {
        return lhs;
    }
    if rhs.is_zero() {
        return int(1);
    }
    Arc::new(SymbolicExpr::Binary {
        op: BinaryOp::Pow,
        lhs,
        rhs,
    })
}

pub fn neg(operand: Arc<SymbolicExpr>) -> Arc<SymbolicExpr> {
    if let Some(n) = operand.as_const() {
        return constant(n.neg());
    }
    Arc::new(SymbolicExpr::Unary {
        op: UnaryOp::Neg,
        operand,
    })
}

pub fn conj(operand: Arc<SymbolicExpr>) -> Arc<SymbolicExpr> {
    Arc::new(SymbolicExpr::Unary {
        op: UnaryOp::Conj,
        operand,
    })
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
            Self::Pow => 3,
        }
    }
}

impl SymbolicExpr {
    fn precedence(&self) -> u8 {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Unary {
                op: UnaryOp::Neg, ..
            } => 2,
            _ => u8::MAX,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        if self.precedence() < parent {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for SymbolicExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(n) => write!(f, "{n}"),
            Self::Var(name) | Self::FuncRef(name) => write!(f, "{name}"),
            Self::Binary { op, lhs, rhs } => {
                lhs.fmt_child(f, op.precedence())?;
                // exponents render unspaced
                match op {
                    BinaryOp::Pow => write!(f, "{op}")?,
                    _ => write!(f, " {op} ")?,
                }
                rhs.fmt_child(f, op.precedence() + 1)
            }
            Self::Unary {
                op: UnaryOp::Neg,
                operand,
            } => {
                write!(f, "-")?;
                operand.fmt_child(f, 3)
            }
            Self::Unary {
                op: UnaryOp::Conj,
                operand,
            } => write!(f, "conj({operand})"),
            Self::Call(name, args) => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_constructor_folding() {
        let x = var("x");
        assert_eq!(add(int(0), Arc::clone(&x)), x);
        assert_eq!(mul(Arc::clone(&x), int(1)), x);
        assert_eq!(mul(int(0), Arc::clone(&x)), int(0));
        assert_eq!(pow(Arc::clone(&x), int(1)), x);
        assert_eq!(sub(int(2), int(1)), int(1));
        assert_eq!(neg(int(3)), int(-3));
    }

    #[test]
    fn display_precedence() {
        // (x + 1) * x needs parentheses, x^2 + x does not
        let x = var("x");
        let expr = mul(add(Arc::clone(&x), int(1)), Arc::clone(&x));
        assert_eq!(expr.to_string(), "(x + 1) * x");
        let expr = add(pow(Arc::clone(&x), int(2)), Arc::clone(&x));
        assert_eq!(expr.to_string(), "x^2 + x");
        assert_eq!(pow(x, int(2)).to_string(), "x^2");
    }

    #[test]
    fn depends_on() {
        let expr = add(mul(var("x"), var("y")), int(4));
        assert!(expr.depends_on("x"));
        assert!(!expr.depends_on("z"));
        assert!(func_ref("f").depends_on("x"));
    }
}
