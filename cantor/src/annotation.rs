use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::error::TypeConstructionError;
use crate::set::{
    self, builtin, comprehend, difference, intersect, list_of, mapping_of, union, BuiltinSet,
    Definitions, SetExpr,
};
use crate::symbolic::SymbolicExpr;
use crate::value::Value;

/// A type annotation as handed over by the parser, not yet resolved against
/// builtin names or `data` declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeAnnotation {
    /// A bare name: either a builtin set or a declared alias.
    Name(String),
    /// A literal set `{1, 2, "x"}`.
    FiniteLiteral(Vec<Value>),
    Tuple(Vec<TypeAnnotation>),
    Power(Box<TypeAnnotation>, i64),
    ListOf(Box<TypeAnnotation>),
    /// `domain -> codomain`.
    Arrow(Box<TypeAnnotation>, Box<TypeAnnotation>),
    Union(Box<TypeAnnotation>, Box<TypeAnnotation>),
    Intersection(Box<TypeAnnotation>, Box<TypeAnnotation>),
    Difference(Box<TypeAnnotation>, Box<TypeAnnotation>),
    /// `{binder in base : predicate}`.
    Refinement {
        base: Box<TypeAnnotation>,
        binder: String,
        predicate: Arc<SymbolicExpr>,
    },
}

lazy_static! {
    static ref BUILTIN_NAMES: HashMap<&'static str, BuiltinSet> = {
        let mut table = HashMap::new();
        for kind in [
            BuiltinSet::Whole,
            BuiltinSet::Nat,
            BuiltinSet::Int,
            BuiltinSet::Real,
            BuiltinSet::Complex,
            BuiltinSet::Str,
            BuiltinSet::Char,
            BuiltinSet::Bool,
            BuiltinSet::Univ,
            BuiltinSet::Empty,
        ] {
            table.insert(kind.name(), kind);
        }
        table
    };
}

/// Resolves a parsed annotation into a set expression.
///
/// Builtin names win over declared aliases; anything else must be present in
/// the definition table, even if not yet defined (forward references inside
/// recursive `data` declarations resolve to an alias of the declared id).
pub fn resolve_type_annotation(
    defs: &Definitions,
    annotation: &TypeAnnotation,
) -> Result<Arc<SetExpr>, TypeConstructionError> {
    match annotation {
        TypeAnnotation::Name(name) => {
            if let Some(kind) = BUILTIN_NAMES.get(name.as_str()) {
                return Ok(builtin(*kind));
            }
            match defs.lookup(name) {
                Some(id) => Ok(defs.alias(id)),
                None => Err(TypeConstructionError::UnknownName(name.clone())),
            }
        }
        TypeAnnotation::FiniteLiteral(items) => Ok(set::finite(items.clone())),
        TypeAnnotation::Tuple(components) => {
            let components = components
                .iter()
                .map(|component| resolve_type_annotation(defs, component))
                .collect::<Result<Vec<_>, _>>()?;
            set::tuple_of(components)
        }
        TypeAnnotation::Power(base, n) => {
            set::power(resolve_type_annotation(defs, base)?, *n)
        }
        TypeAnnotation::ListOf(element) => {
            Ok(list_of(resolve_type_annotation(defs, element)?))
        }
        TypeAnnotation::Arrow(domain, codomain) => Ok(mapping_of(
            resolve_type_annotation(defs, domain)?,
            resolve_type_annotation(defs, codomain)?,
        )),
        TypeAnnotation::Union(a, b) => Ok(union(
            resolve_type_annotation(defs, a)?,
            resolve_type_annotation(defs, b)?,
        )),
        TypeAnnotation::Intersection(a, b) => Ok(intersect(
            resolve_type_annotation(defs, a)?,
            resolve_type_annotation(defs, b)?,
        )),
        TypeAnnotation::Difference(a, b) => Ok(difference(
            resolve_type_annotation(defs, a)?,
            resolve_type_annotation(defs, b)?,
        )),
        TypeAnnotation::Refinement {
            base,
            binder,
            predicate,
        } => Ok(comprehend(
            resolve_type_annotation(defs, base)?,
            binder.clone(),
            Arc::clone(predicate),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::{call, int, var};

    fn name(n: &str) -> TypeAnnotation {
        TypeAnnotation::Name(n.to_string())
    }

    #[test]
    fn builtin_names() {
        let defs = Definitions::new();
        let set = resolve_type_annotation(&defs, &name("Int")).unwrap();
        assert_eq!(*set, SetExpr::Builtin(BuiltinSet::Int));
        assert_eq!(
            resolve_type_annotation(&defs, &name("Quaternion")),
            Err(TypeConstructionError::UnknownName("Quaternion".to_string()))
        );
    }

    #[test]
    fn declared_names_resolve_to_aliases() {
        let mut defs = Definitions::new();
        let id = defs.insert("Digit", set::finite((0..10).map(Value::integer).collect()));
        let set = resolve_type_annotation(&defs, &name("Digit")).unwrap();
        assert_eq!(set, defs.alias(id));
    }

    #[test]
    fn composite_annotation() {
        let defs = Definitions::new();
        // [Int | Str] -> Real^2
        let annotation = TypeAnnotation::Arrow(
            Box::new(TypeAnnotation::ListOf(Box::new(TypeAnnotation::Union(
                Box::new(name("Int")),
                Box::new(name("Str")),
            )))),
            Box::new(TypeAnnotation::Power(Box::new(name("Real")), 2)),
        );
        let set = resolve_type_annotation(&defs, &annotation).unwrap();
        assert_eq!(set.to_string(), "[Int | Str] -> Real^2");
    }

    #[test]
    fn structural_errors_propagate() {
        let defs = Definitions::new();
        assert_eq!(
            resolve_type_annotation(
                &defs,
                &TypeAnnotation::Power(Box::new(name("Int")), -1)
            ),
            Err(TypeConstructionError::NegativePower(-1))
        );
        assert_eq!(
            resolve_type_annotation(&defs, &TypeAnnotation::Tuple(vec![])),
            Err(TypeConstructionError::EmptyTuple)
        );
    }

    #[test]
    fn refinement() {
        let defs = Definitions::new();
        let annotation = TypeAnnotation::Refinement {
            base: Box::new(name("Int")),
            binder: "x".to_string(),
            predicate: call("gt", vec![var("x"), int(0)]),
        };
        let set = resolve_type_annotation(&defs, &annotation).unwrap();
        assert_eq!(set.to_string(), "{x in Int : gt(x, 0)}");
    }
}
