use std::sync::Arc;

use crate::error::{BindError, TypeConstructionError};
use crate::membership::{contains, subset_of};
use crate::set::{mapping_of, tuple_of, Definitions, SetExpr};
use crate::symbolic::SymbolicExpr;
use crate::ternary::Ternary;
use crate::value::{FunctionValue, Value};

/// How the binder treats an `Unknown` oracle answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownPolicy {
    /// Refuse the bind with a [`BindError::Undecided`] diagnostic.
    #[default]
    Reject,
    /// Accept the bind but attach a warning.
    Warn,
}

/// A name bound to its typeset, with the value when the bind carried one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub typeset: Arc<SetExpr>,
    pub value: Option<Value>,
}

#[derive(Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: anyhow::Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Diagnostic {
    pub fn error(error: impl Into<anyhow::Error>) -> Self {
        Self {
            severity: Severity::Error,
            error: error.into(),
        }
    }

    pub fn warning(error: impl Into<anyhow::Error>) -> Self {
        Self {
            severity: Severity::Warning,
            error: error.into(),
        }
    }
}

/// The outcome of a bind: the binding when it succeeded, plus whatever
/// diagnostics accumulated. A failed bind never aborts anything beyond the
/// statement that requested it.
pub struct BindResult<T> {
    pub value: Option<T>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> BindResult<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value: Some(value),
            diagnostics: Vec::new(),
        }
    }

    pub fn ok_with_diagnostics(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            value: Some(value),
            diagnostics,
        }
    }

    pub fn error(diagnostic: Diagnostic) -> Self {
        Self {
            value: None,
            diagnostics: vec![diagnostic],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.value.is_some()
    }
}

/// Checks `value` against `typeset` through the membership oracle and binds
/// on success.
pub fn bind_value(
    defs: &Definitions,
    name: impl Into<String>,
    typeset: Arc<SetExpr>,
    value: Value,
    policy: UnknownPolicy,
) -> BindResult<Binding> {
    let name = name.into();
    match contains(defs, &typeset, &value) {
        Ternary::True => BindResult::ok(Binding {
            name,
            typeset,
            value: Some(value),
        }),
        Ternary::False => BindResult::error(Diagnostic::error(BindError::Mismatch {
            value: value.to_string(),
            typeset: typeset.to_string(),
        })),
        Ternary::Unknown => {
            let undecided = BindError::Undecided {
                value: value.to_string(),
                typeset: typeset.to_string(),
            };
            match policy {
                UnknownPolicy::Reject => BindResult::error(Diagnostic::error(undecided)),
                UnknownPolicy::Warn => BindResult::ok_with_diagnostics(
                    Binding {
                        name,
                        typeset,
                        value: Some(value),
                    },
                    vec![Diagnostic::warning(undecided)],
                ),
            }
        }
    }
}

/// Binds a function declaration with per-parameter typesets.
///
/// The parameter sets compose into a `Mapping` typeset; the inferred return
/// set, when available, is checked against the declared codomain. An
/// undecidable return check only warns, since inferred sets for `Real` or
/// `Complex` arithmetic are rarely exact.
pub fn bind_function(
    defs: &Definitions,
    name: impl Into<String>,
    params: Vec<(String, Arc<SetExpr>)>,
    codomain: Arc<SetExpr>,
    body: Arc<SymbolicExpr>,
    inferred_return: Option<Arc<SetExpr>>,
) -> BindResult<Binding> {
    let name = name.into();
    let domain = match compose_domain(&params) {
        Ok(domain) => domain,
        Err(error) => return BindResult::error(Diagnostic::error(error)),
    };

    let mut diagnostics = Vec::new();
    match inferred_return {
        Some(inferred) => match subset_of(defs, &inferred, &codomain) {
            Ternary::True => {}
            Ternary::False => {
                return BindResult::error(Diagnostic::error(BindError::Mismatch {
                    value: inferred.to_string(),
                    typeset: codomain.to_string(),
                }));
            }
            Ternary::Unknown => diagnostics.push(Diagnostic::warning(BindError::Undecided {
                value: inferred.to_string(),
                typeset: codomain.to_string(),
            })),
        },
        None => diagnostics.push(Diagnostic::warning(BindError::Undecided {
            value: format!("return of '{name}'"),
            typeset: codomain.to_string(),
        })),
    }

    let param_names = params.into_iter().map(|(param, _)| param).collect();
    let function = FunctionValue::symbolic(
        param_names,
        body,
        Some(Arc::clone(&domain)),
        Some(Arc::clone(&codomain)),
    )
    .named(name.clone());
    let typeset = mapping_of(domain, codomain);
    BindResult::ok_with_diagnostics(
        Binding {
            name,
            typeset,
            value: Some(Value::Function(function)),
        },
        diagnostics,
    )
}

fn compose_domain(
    params: &[(String, Arc<SetExpr>)],
) -> Result<Arc<SetExpr>, TypeConstructionError> {
    match params {
        [(_, single)] => Ok(Arc::clone(single)),
        many => tuple_of(many.iter().map(|(_, set)| Arc::clone(set)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::{builtin, BuiltinSet};
    use crate::symbolic::{int, mul, var};

    fn defs() -> Definitions {
        Definitions::new()
    }

    #[test]
    fn bind_accepts_member() {
        let defs = defs();
        let result = bind_value(
            &defs,
            "n",
            builtin(BuiltinSet::Int),
            Value::integer(-4),
            UnknownPolicy::Reject,
        );
        assert!(result.is_ok());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn bind_rejects_non_member() {
        let defs = defs();
        let result = bind_value(
            &defs,
            "n",
            builtin(BuiltinSet::Nat),
            Value::integer(0),
            UnknownPolicy::Reject,
        );
        assert!(!result.is_ok());
        assert_eq!(result.diagnostics[0].severity, Severity::Error);
        let rendered = result.diagnostics[0].error.to_string();
        assert!(rendered.contains("not in"), "unexpected message: {rendered}");
    }

    #[test]
    fn unknown_policy() {
        let mut defs = Definitions::new();
        let opaque_id = defs.declare("Opaque");
        let opaque = defs.alias(opaque_id);
        let rejected = bind_value(
            &defs,
            "x",
            Arc::clone(&opaque),
            Value::integer(1),
            UnknownPolicy::Reject,
        );
        assert!(!rejected.is_ok());
        assert_eq!(rejected.diagnostics[0].severity, Severity::Error);

        let warned = bind_value(&defs, "x", opaque, Value::integer(1), UnknownPolicy::Warn);
        assert!(warned.is_ok());
        assert_eq!(warned.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn function_bind_composes_mapping() {
        let defs = defs();
        // double(x: Int) -> Int = 2 * x, with the return set inferred as Int
        let result = bind_function(
            &defs,
            "double",
            vec![("x".to_string(), builtin(BuiltinSet::Int))],
            builtin(BuiltinSet::Int),
            mul(int(2), var("x")),
            Some(builtin(BuiltinSet::Int)),
        );
        assert!(result.is_ok());
        assert!(result.diagnostics.is_empty());
        let binding = result.value.unwrap();
        assert_eq!(binding.typeset.to_string(), "Int -> Int");
        let function = binding.value.unwrap();
        assert_eq!(contains(&defs, &binding.typeset, &function), Ternary::True);
    }

    #[test]
    fn function_bind_checks_return_set() {
        let defs = defs();
        let bad = bind_function(
            &defs,
            "broken",
            vec![("x".to_string(), builtin(BuiltinSet::Int))],
            builtin(BuiltinSet::Int),
            var("x"),
            Some(builtin(BuiltinSet::Str)),
        );
        assert!(!bad.is_ok());

        // unknown inferred return passes with a warning, not a failure
        let unknown = bind_function(
            &defs,
            "mystery",
            vec![("x".to_string(), builtin(BuiltinSet::Real))],
            builtin(BuiltinSet::Real),
            var("x"),
            None,
        );
        assert!(unknown.is_ok());
        assert_eq!(unknown.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn multi_parameter_domain() {
        let defs = defs();
        let result = bind_function(
            &defs,
            "add",
            vec![
                ("a".to_string(), builtin(BuiltinSet::Int)),
                ("b".to_string(), builtin(BuiltinSet::Int)),
            ],
            builtin(BuiltinSet::Int),
            var("a"),
            Some(builtin(BuiltinSet::Int)),
        );
        let binding = result.value.unwrap();
        assert_eq!(binding.typeset.to_string(), "(Int, Int) -> Int");
    }
}
