use std::fmt;
use std::sync::Arc;

use crate::error::EvalError;
use crate::set::SetExpr;
use crate::symbolic::{self, SymbolicExpr};

pub mod number;

pub use number::Number;

/// A tagged runtime value; both data and a candidate for membership tests.
///
/// Values are immutable once constructed and cheap to share.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Value {
    Number(Number),
    Str(String),
    Char(char),
    Bool(bool),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Function(FunctionValue),
}

impl Value {
    pub fn integer(value: i64) -> Self {
        Self::Number(Number::from(value))
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }
}

/// A function as a first-class value, drawn from a mapping-set.
///
/// The declared (or inferred) domain and codomain sets are carried along so
/// the membership oracle can test the function against `Mapping` sets. Both
/// are optional: a purely symbolic function may not know its sets, in which
/// case mapping membership degrades to `Unknown`.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct FunctionValue {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub domain: Option<Arc<SetExpr>>,
    pub codomain: Option<Arc<SetExpr>>,
    pub body: FunctionBody,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum FunctionBody {
    /// An expression over the parameters.
    Symbolic(Arc<SymbolicExpr>),
    /// An explicit argument-to-result table; how enumerated mapping-sets
    /// over finite domains represent their elements.
    Graph(Vec<(Value, Value)>),
    /// The same result for every argument; how enumerated mapping-sets over
    /// infinite domains represent their lone element.
    Const(Box<Value>),
}

impl FunctionValue {
    pub fn symbolic(
        params: Vec<String>,
        body: Arc<SymbolicExpr>,
        domain: Option<Arc<SetExpr>>,
        codomain: Option<Arc<SetExpr>>,
    ) -> Self {
        Self {
            name: None,
            params,
            domain,
            codomain,
            body: FunctionBody::Symbolic(body),
        }
    }

    pub fn graph(
        pairs: Vec<(Value, Value)>,
        domain: Arc<SetExpr>,
        codomain: Arc<SetExpr>,
    ) -> Self {
        Self {
            name: None,
            params: vec!["x".to_string()],
            domain: Some(domain),
            codomain: Some(codomain),
            body: FunctionBody::Graph(pairs),
        }
    }

    pub fn constant(result: Value, domain: Arc<SetExpr>, codomain: Arc<SetExpr>) -> Self {
        Self {
            name: None,
            params: vec!["x".to_string()],
            domain: Some(domain),
            codomain: Some(codomain),
            body: FunctionBody::Const(Box::new(result)),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Applies the function to concrete arguments.
    pub fn apply(&self, args: &[Value]) -> Result<Value, EvalError> {
        let display_name = self.name.clone().unwrap_or_else(|| "<fn>".to_string());
        if args.len() != self.arity() {
            return Err(EvalError::Arity {
                name: display_name,
                expected: self.arity(),
                got: args.len(),
            });
        }
        match &self.body {
            FunctionBody::Symbolic(body) => {
                let bindings = self
                    .params
                    .iter()
                    .cloned()
                    .zip(args.iter().cloned())
                    .collect();
                symbolic::eval(body, &bindings)
            }
            FunctionBody::Graph(pairs) => {
                let key = match args {
                    [single] => single.clone(),
                    many => Value::Tuple(many.to_vec()),
                };
                pairs
                    .iter()
                    .find(|(arg, _)| *arg == key)
                    .map(|(_, result)| result.clone())
                    .ok_or(EvalError::InvalidOperand {
                        op: display_name,
                        operand: key.to_string(),
                    })
            }
            FunctionBody::Const(result) => Ok((**result).clone()),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Char(c) => write!(f, "'{c}'"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Tuple(values) => {
                write!(f, "(")?;
                write_joined(f, values)?;
                write!(f, ")")
            }
            Self::List(values) => {
                write!(f, "[")?;
                write_joined(f, values)?;
                write!(f, "]")
            }
            Self::Function(func) => match &func.name {
                Some(name) => write!(f, "<fn {name}>"),
                None => write!(f, "<fn({})>", func.params.join(", ")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let value = Value::Tuple(vec![
            Value::integer(1),
            Value::str("hi"),
            Value::List(vec![Value::Bool(true), Value::Char('a')]),
        ]);
        assert_eq!(value.to_string(), "(1, \"hi\", [true, 'a'])");
    }

    #[test]
    fn graph_application() {
        let domain = crate::set::finite(vec![Value::integer(0), Value::integer(1)]);
        let codomain = crate::set::finite(vec![Value::Bool(false), Value::Bool(true)]);
        let func = FunctionValue::graph(
            vec![
                (Value::integer(0), Value::Bool(false)),
                (Value::integer(1), Value::Bool(true)),
            ],
            domain,
            codomain,
        );
        assert_eq!(func.apply(&[Value::integer(1)]).unwrap(), Value::Bool(true));
        assert!(func.apply(&[Value::integer(2)]).is_err());
        assert!(func.apply(&[]).is_err());
    }

    #[test]
    fn constant_application() {
        use crate::set::{builtin, BuiltinSet};
        let func = FunctionValue::constant(
            Value::integer(0),
            builtin(BuiltinSet::Int),
            crate::set::finite(vec![Value::integer(0)]),
        );
        assert_eq!(func.apply(&[Value::integer(7)]).unwrap(), Value::integer(0));
        assert_eq!(func.apply(&[Value::str("x")]).unwrap(), Value::integer(0));
        assert!(func.apply(&[]).is_err());
    }
}
