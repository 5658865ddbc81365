use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::error::UnsupportedDerivativeError;
use crate::symbolic::{
    add, call, div, func_ref, int, mul, neg, pow, sub, BinaryOp, SymbolicExpr, UnaryOp,
};

type InnerDerivative = fn(&Arc<SymbolicExpr>) -> Arc<SymbolicExpr>;

lazy_static! {
    /// Derivative of each differentiable builtin at its (single) argument.
    static ref DERIVATIVE_TABLE: HashMap<&'static str, InnerDerivative> = {
        let mut table: HashMap<&'static str, InnerDerivative> = HashMap::new();
        table.insert("sin", |u| call("cos", vec![Arc::clone(u)]));
        table.insert("cos", |u| neg(call("sin", vec![Arc::clone(u)])));
        table.insert("tan", |u| {
            div(int(1), pow(call("cos", vec![Arc::clone(u)]), int(2)))
        });
        table.insert("exp", |u| call("exp", vec![Arc::clone(u)]));
        table.insert("ln", |u| div(int(1), Arc::clone(u)));
        table.insert("sqrt", |u| {
            div(int(1), mul(int(2), call("sqrt", vec![Arc::clone(u)])))
        });
        table.insert("sinh", |u| call("cosh", vec![Arc::clone(u)]));
        table.insert("cosh", |u| call("sinh", vec![Arc::clone(u)]));
        table
    };
}

/// Differentiates `expr` with respect to `var`, purely structurally.
///
/// The result is a new, unevaluated tree; no numeric evaluation happens here.
/// Builtins without a table entry (and `conj`, which is not complex
/// differentiable) raise [`UnsupportedDerivativeError`], a local condition
/// the caller reports without aborting anything else.
pub fn differentiate(
    expr: &SymbolicExpr,
    var: &str,
) -> Result<Arc<SymbolicExpr>, UnsupportedDerivativeError> {
    match expr {
        SymbolicExpr::Const(_) => Ok(int(0)),
        SymbolicExpr::Var(name) => Ok(if name == var { int(1) } else { int(0) }),
        SymbolicExpr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => Ok(neg(differentiate(operand, var)?)),
        SymbolicExpr::Unary {
            op: UnaryOp::Conj, ..
        } => Err(UnsupportedDerivativeError("conj".to_string())),
        SymbolicExpr::Binary { op, lhs, rhs } => {
            let dl = differentiate(lhs, var)?;
            match op {
                BinaryOp::Add => Ok(add(dl, differentiate(rhs, var)?)),
                BinaryOp::Sub => Ok(sub(dl, differentiate(rhs, var)?)),
                BinaryOp::Mul => {
                    let dr = differentiate(rhs, var)?;
                    Ok(add(
                        mul(dl, Arc::clone(rhs)),
                        mul(Arc::clone(lhs), dr),
                    ))
                }
                BinaryOp::Div => {
                    let dr = differentiate(rhs, var)?;
                    Ok(div(
                        sub(
                            mul(dl, Arc::clone(rhs)),
                            mul(Arc::clone(lhs), dr),
                        ),
                        pow(Arc::clone(rhs), int(2)),
                    ))
                }
                BinaryOp::Pow => differentiate_pow(lhs, rhs, dl, var),
            }
        }
        SymbolicExpr::Call(name, args) => {
            let rule = DERIVATIVE_TABLE
                .get(name.as_str())
                .ok_or_else(|| UnsupportedDerivativeError(name.clone()))?;
            let [arg] = &args[..] else {
                return Err(UnsupportedDerivativeError(name.clone()));
            };
            // chain rule: (g ∘ u)' = g'(u) * u'
            let du = differentiate(arg, var)?;
            Ok(mul(rule(arg), du))
        }
        // point-free: `f` stands for `f(x)`, so its derivative is `f'`
        SymbolicExpr::FuncRef(name) => Ok(func_ref(format!("{name}'"))),
    }
}

/// Power rule when the exponent is free of `var`, logarithmic differentiation
/// otherwise: `(f^g)' = f^g * (g' ln f + g f' / f)`.
fn differentiate_pow(
    base: &Arc<SymbolicExpr>,
    exponent: &Arc<SymbolicExpr>,
    dbase: Arc<SymbolicExpr>,
    var: &str,
) -> Result<Arc<SymbolicExpr>, UnsupportedDerivativeError> {
    if !exponent.depends_on(var) {
        let reduced = sub(Arc::clone(exponent), int(1));
        return Ok(mul(
            mul(Arc::clone(exponent), pow(Arc::clone(base), reduced)),
            dbase,
        ));
    }
    let dexp = differentiate(exponent, var)?;
    Ok(mul(
        pow(Arc::clone(base), Arc::clone(exponent)),
        add(
            mul(dexp, call("ln", vec![Arc::clone(base)])),
            div(mul(Arc::clone(exponent), dbase), Arc::clone(base)),
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::{eval, var, Bindings};
    use crate::value::Value;

    fn at(expr: &SymbolicExpr, x: i64) -> Value {
        let mut bindings = Bindings::new();
        bindings.insert("x".to_string(), Value::integer(x));
        eval(expr, &bindings).unwrap()
    }

    #[test]
    fn polynomial() {
        // d/dx (x^2 - 2x + 1) = 2x - 2, checked at sample points
        let x = var("x");
        let expr = add(
            sub(
                pow(Arc::clone(&x), int(2)),
                mul(int(2), Arc::clone(&x)),
            ),
            int(1),
        );
        let derived = differentiate(&expr, "x").unwrap();
        for (point, expected) in [(3, 4), (0, -2), (-1, -4)] {
            assert_eq!(at(&derived, point), Value::integer(expected));
        }
    }

    #[test]
    fn constant_and_variable() {
        assert_eq!(differentiate(&int(42), "x").unwrap(), int(0));
        assert_eq!(differentiate(&var("x"), "x").unwrap(), int(1));
        assert_eq!(differentiate(&var("y"), "x").unwrap(), int(0));
    }

    #[test]
    fn quotient_rule() {
        // d/dx (x / (x + 1)) = 1 / (x + 1)^2
        let expr = div(var("x"), add(var("x"), int(1)));
        let derived = differentiate(&expr, "x").unwrap();
        assert_eq!(
            at(&derived, 1),
            Value::Number(crate::value::Number::from_rational(num::BigRational::new(
                num::BigInt::from(1),
                num::BigInt::from(4),
            )))
        );
    }

    #[test]
    fn chain_rule_through_builtin() {
        // d/dx sin(x^2) = cos(x^2) * 2x
        let expr = call("sin", vec![pow(var("x"), int(2))]);
        let derived = differentiate(&expr, "x").unwrap();
        assert_eq!(derived.to_string(), "cos(x^2) * (2 * x)");
    }

    #[test]
    fn symbolic_exponent_goes_logarithmic() {
        // x^x needs logarithmic differentiation; the result mentions ln
        let expr = pow(var("x"), var("x"));
        let derived = differentiate(&expr, "x").unwrap();
        assert!(derived.to_string().contains("ln"));
    }

    #[test]
    fn point_free_composition() {
        // (f^2)' = 2 * f * f'
        let expr = pow(func_ref("f"), int(2));
        let derived = differentiate(&expr, "x").unwrap();
        assert_eq!(derived.to_string(), "2 * f * f'");
    }

    #[test]
    fn unsupported_builtin() {
        let expr = call("gamma", vec![var("x")]);
        assert_eq!(
            differentiate(&expr, "x"),
            Err(UnsupportedDerivativeError("gamma".to_string()))
        );
    }
}
