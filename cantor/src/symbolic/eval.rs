use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::EvalError;
use crate::symbolic::{BinaryOp, SymbolicExpr, UnaryOp};
use crate::value::{Number, Value};

/// Concrete variable bindings for evaluation.
pub type Bindings = HashMap<String, Value>;

/// Evaluates an expression against concrete bindings, exactly.
///
/// Arithmetic stays in the exact numeric tower; builtins without an exact
/// value (the transcendentals) are rejected rather than approximated. `+`
/// concatenates when either side is a string, matching the language's
/// string semantics.
pub fn eval(expr: &SymbolicExpr, bindings: &Bindings) -> Result<Value, EvalError> {
    match expr {
        SymbolicExpr::Const(n) => Ok(Value::Number(n.clone())),
        SymbolicExpr::Var(name) => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::Unbound(name.clone())),
        SymbolicExpr::Unary { op, operand } => {
            let operand = eval(operand, bindings)?;
            let number = as_number(op.to_string(), &operand)?;
            match op {
                UnaryOp::Neg => Ok(Value::Number(number.neg())),
                UnaryOp::Conj => Ok(Value::Number(number.conj())),
            }
        }
        SymbolicExpr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, bindings)?;
            let rhs = eval(rhs, bindings)?;
            apply_binary(*op, lhs, rhs)
        }
        SymbolicExpr::Call(name, args) => {
            let args = args
                .iter()
                .map(|arg| eval(arg, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            apply_builtin(name, &args, bindings)
        }
        SymbolicExpr::FuncRef(name) => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::Unbound(name.clone())),
    }
}

fn as_number(op: impl Into<String>, value: &Value) -> Result<&Number, EvalError> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(EvalError::InvalidOperand {
            op: op.into(),
            operand: other.to_string(),
        }),
    }
}

fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    // string concatenation wins over arithmetic for `+`
    if op == BinaryOp::Add {
        match (&lhs, &rhs) {
            (Value::Str(l), r) => return Ok(Value::Str(format!("{l}{}", bare(r)))),
            (l, Value::Str(r)) => return Ok(Value::Str(format!("{}{r}", bare(l)))),
            _ => {}
        }
    }
    let l = as_number(op.to_string(), &lhs)?;
    let r = as_number(op.to_string(), &rhs)?;
    let result = match op {
        BinaryOp::Add => l.add(r),
        BinaryOp::Sub => l.sub(r),
        BinaryOp::Mul => l.mul(r),
        BinaryOp::Div => l.div(r)?,
        BinaryOp::Pow => l.pow(r)?,
    };
    Ok(Value::Number(result))
}

/// Display form without string quotes, for concatenation.
fn bare(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() != expected {
        return Err(EvalError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn compare(name: &str, args: &[Value]) -> Result<Ordering, EvalError> {
    expect_arity(name, args, 2)?;
    let l = as_number(name, &args[0])?;
    let r = as_number(name, &args[1])?;
    l.cmp_real(r).ok_or_else(|| EvalError::InvalidOperand {
        op: name.to_string(),
        operand: "complex numbers are unordered".to_string(),
    })
}

fn apply_builtin(name: &str, args: &[Value], bindings: &Bindings) -> Result<Value, EvalError> {
    match name {
        "mod" => {
            expect_arity(name, args, 2)?;
            let l = as_number(name, &args[0])?;
            let r = as_number(name, &args[1])?;
            Ok(Value::Number(l.modulo(r)?))
        }
        "abs" => {
            expect_arity(name, args, 1)?;
            Ok(Value::Number(as_number(name, &args[0])?.abs()?))
        }
        "eq" => {
            expect_arity(name, args, 2)?;
            Ok(Value::Bool(args[0] == args[1]))
        }
        "ne" => {
            expect_arity(name, args, 2)?;
            Ok(Value::Bool(args[0] != args[1]))
        }
        "lt" => Ok(Value::Bool(compare(name, args)? == Ordering::Less)),
        "le" => Ok(Value::Bool(compare(name, args)? != Ordering::Greater)),
        "gt" => Ok(Value::Bool(compare(name, args)? == Ordering::Greater)),
        "ge" => Ok(Value::Bool(compare(name, args)? != Ordering::Less)),
        "min" => Ok(match compare(name, args)? {
            Ordering::Greater => args[1].clone(),
            _ => args[0].clone(),
        }),
        "max" => Ok(match compare(name, args)? {
            Ordering::Less => args[1].clone(),
            _ => args[0].clone(),
        }),
        "not" => {
            expect_arity(name, args, 1)?;
            match &args[0] {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(EvalError::InvalidOperand {
                    op: name.to_string(),
                    operand: other.to_string(),
                }),
            }
        }
        "and" | "or" => {
            expect_arity(name, args, 2)?;
            match (&args[0], &args[1]) {
                (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(if name == "and" {
                    *l && *r
                } else {
                    *l || *r
                })),
                _ => Err(EvalError::InvalidOperand {
                    op: name.to_string(),
                    operand: format!("({}, {})", args[0], args[1]),
                }),
            }
        }
        // transcendentals exist symbolically but have no exact value
        "sin" | "cos" | "tan" | "exp" | "ln" | "sqrt" | "sinh" | "cosh" => {
            Err(EvalError::Inexact(name.to_string()))
        }
        _ => match bindings.get(name) {
            Some(Value::Function(func)) => func.apply(args),
            Some(other) => Err(EvalError::NotCallable(other.to_string())),
            None => Err(EvalError::UnknownBuiltin(name.to_string())),
        },
    }
}
