use crate::set::{BuiltinSet, Definitions, SetExpr, MAX_ALIAS_DEPTH};
use crate::symbolic::{eval, Bindings};
use crate::ternary::Ternary;
use crate::value::Value;

/// Decides `value ∈ set`, soundly.
///
/// Pure and total: cases that would require unbounded search (opaque aliases,
/// symbolic functions without declared sets, failing predicates) answer
/// [`Ternary::Unknown`] instead of diverging or throwing. Repeated calls with
/// the same arguments give the same answer.
pub fn contains(defs: &Definitions, set: &SetExpr, value: &Value) -> Ternary {
    contains_at(defs, set, value, 0)
}

/// Sound-but-incomplete subset check between two set expressions.
pub fn subset_of(defs: &Definitions, a: &SetExpr, b: &SetExpr) -> Ternary {
    subset_at(defs, a, b, 0)
}

/// Semantic set equality: mutual inclusion.
///
/// Decides structural forms (and pairs like `Bool` against `{true, false}`);
/// answers `Unknown` where either inclusion does.
pub fn set_eq(defs: &Definitions, a: &SetExpr, b: &SetExpr) -> Ternary {
    if a == b {
        return Ternary::True;
    }
    subset_at(defs, a, b, 0).and(|| subset_at(defs, b, a, 0))
}

fn contains_at(defs: &Definitions, set: &SetExpr, value: &Value, depth: usize) -> Ternary {
    match set {
        SetExpr::Builtin(kind) => builtin_contains(*kind, value),
        SetExpr::Finite(items) => items.contains(value).into(),
        SetExpr::Tuple(components) => match value {
            Value::Tuple(items) if items.len() == components.len() => {
                all_contained(defs, components.iter().zip(items), depth)
            }
            _ => Ternary::False,
        },
        SetExpr::Power(base, n) => match value {
            Value::Tuple(items) if items.len() == *n as usize => {
                all_contained(defs, items.iter().map(|item| (base, item)), depth)
            }
            _ => Ternary::False,
        },
        SetExpr::ListOf(element) => match value {
            Value::List(items) => {
                all_contained(defs, items.iter().map(|item| (element, item)), depth)
            }
            _ => Ternary::False,
        },
        SetExpr::Mapping(domain, codomain) => match value {
            Value::Function(func) => match (&func.domain, &func.codomain) {
                (Some(d), Some(r)) => subset_at(defs, d, domain, depth)
                    .and(|| subset_at(defs, r, codomain, depth)),
                // a function without declared sets cannot be placed
                _ => Ternary::Unknown,
            },
            _ => Ternary::False,
        },
        SetExpr::Union(a, b) => {
            contains_at(defs, a, value, depth).or(|| contains_at(defs, b, value, depth))
        }
        SetExpr::Intersection(a, b) => {
            contains_at(defs, a, value, depth).and(|| contains_at(defs, b, value, depth))
        }
        SetExpr::Difference(a, b) => {
            contains_at(defs, a, value, depth).and(|| contains_at(defs, b, value, depth).not())
        }
        SetExpr::Comprehension {
            base,
            binder,
            predicate,
        } => contains_at(defs, base, value, depth).and(|| {
            let mut bindings = Bindings::new();
            bindings.insert(binder.clone(), value.clone());
            match eval(predicate, &bindings) {
                Ok(Value::Bool(holds)) => holds.into(),
                // evaluation failure degrades, never aborts the oracle
                _ => Ternary::Unknown,
            }
        }),
        SetExpr::Alias { id, .. } => {
            if depth >= MAX_ALIAS_DEPTH {
                return Ternary::Unknown;
            }
            match defs.resolve(*id) {
                Some(definition) => contains_at(defs, definition, value, depth + 1),
                None => Ternary::Unknown,
            }
        }
    }
}

fn all_contained<'a>(
    defs: &Definitions,
    pairs: impl Iterator<Item = (&'a std::sync::Arc<SetExpr>, &'a Value)>,
    depth: usize,
) -> Ternary {
    let mut result = Ternary::True;
    for (set, item) in pairs {
        result = result.and(|| contains_at(defs, set, item, depth));
        if result.is_false() {
            break;
        }
    }
    result
}

fn builtin_contains(kind: BuiltinSet, value: &Value) -> Ternary {
    match kind {
        BuiltinSet::Univ => Ternary::True,
        BuiltinSet::Empty => Ternary::False,
        BuiltinSet::Whole => matches!(value, Value::Number(n) if n.is_whole()).into(),
        BuiltinSet::Nat => matches!(value, Value::Number(n) if n.is_natural()).into(),
        BuiltinSet::Int => matches!(value, Value::Number(n) if n.is_integer()).into(),
        BuiltinSet::Real => matches!(value, Value::Number(n) if n.is_real()).into(),
        BuiltinSet::Complex => matches!(value, Value::Number(_)).into(),
        BuiltinSet::Str => matches!(value, Value::Str(_)).into(),
        BuiltinSet::Char => matches!(value, Value::Char(_)).into(),
        BuiltinSet::Bool => matches!(value, Value::Bool(_)).into(),
    }
}

fn subset_at(defs: &Definitions, a: &SetExpr, b: &SetExpr, depth: usize) -> Ternary {
    if a.is_syntactically_empty() || a == b {
        return Ternary::True;
    }
    if depth >= MAX_ALIAS_DEPTH {
        return Ternary::Unknown;
    }
    match (a, b) {
        (SetExpr::Alias { id, .. }, _) => match defs.resolve(*id) {
            Some(definition) => subset_at(defs, definition, b, depth + 1),
            None => Ternary::Unknown,
        },
        (_, SetExpr::Alias { id, .. }) => match defs.resolve(*id) {
            Some(definition) => subset_at(defs, a, definition, depth + 1),
            None => Ternary::Unknown,
        },
        // a finite left side reduces to membership of each element
        (SetExpr::Finite(items), _) => {
            let mut result = Ternary::True;
            for item in items {
                result = result.and(|| contains_at(defs, b, item, depth));
                if result.is_false() {
                    break;
                }
            }
            result
        }
        (SetExpr::Builtin(BuiltinSet::Bool), _) => contains_at(defs, b, &Value::Bool(false), depth)
            .and(|| contains_at(defs, b, &Value::Bool(true), depth)),
        (SetExpr::Union(x, y), _) => {
            subset_at(defs, x, b, depth).and(|| subset_at(defs, y, b, depth))
        }
        (_, SetExpr::Intersection(x, y)) => {
            subset_at(defs, a, x, depth).and(|| subset_at(defs, a, y, depth))
        }
        // the intersection is a subset of each operand
        (SetExpr::Intersection(x, y), _) => {
            match subset_at(defs, x, b, depth).or(|| subset_at(defs, y, b, depth)) {
                Ternary::True => Ternary::True,
                _ => Ternary::Unknown,
            }
        }
        (SetExpr::Difference(x, _), _) => match subset_at(defs, x, b, depth) {
            Ternary::True => Ternary::True,
            _ => Ternary::Unknown,
        },
        (SetExpr::Comprehension { base, .. }, _) => match subset_at(defs, base, b, depth) {
            Ternary::True => Ternary::True,
            _ => Ternary::Unknown,
        },
        // membership in either branch suffices, but failure of both does not
        // refute inclusion (a may straddle the union)
        (_, SetExpr::Union(x, y)) => {
            match subset_at(defs, a, x, depth).or(|| subset_at(defs, a, y, depth)) {
                Ternary::True => Ternary::True,
                _ => Ternary::Unknown,
            }
        }
        (SetExpr::Builtin(x), SetExpr::Builtin(y)) => builtin_subset(*x, *y),
        (SetExpr::Tuple(_) | SetExpr::Power(..), SetExpr::Tuple(_) | SetExpr::Power(..)) => {
            let (Some(xs), Some(ys)) = (a.components(), b.components()) else {
                return Ternary::Unknown;
            };
            if xs.len() != ys.len() {
                return Ternary::False;
            }
            let mut result = Ternary::True;
            for (x, y) in xs.iter().zip(&ys) {
                result = result.and(|| subset_at(defs, x, y, depth));
                if result.is_false() {
                    break;
                }
            }
            result
        }
        (SetExpr::ListOf(x), SetExpr::ListOf(y)) => subset_at(defs, x, y, depth),
        // mapping sets are monotone in both components under the membership
        // semantics above
        (SetExpr::Mapping(d1, r1), SetExpr::Mapping(d2, r2)) => {
            subset_at(defs, d1, d2, depth).and(|| subset_at(defs, r1, r2, depth))
        }
        _ => Ternary::Unknown,
    }
}

/// Numeric tower position: `Nat ⊂ Whole ⊂ Int ⊂ Real ⊂ Complex`.
fn numeric_rank(kind: BuiltinSet) -> Option<u8> {
    match kind {
        BuiltinSet::Nat => Some(0),
        BuiltinSet::Whole => Some(1),
        BuiltinSet::Int => Some(2),
        BuiltinSet::Real => Some(3),
        BuiltinSet::Complex => Some(4),
        _ => None,
    }
}

fn builtin_subset(a: BuiltinSet, b: BuiltinSet) -> Ternary {
    if a == b || b == BuiltinSet::Univ {
        return Ternary::True;
    }
    if b == BuiltinSet::Empty || a == BuiltinSet::Univ {
        return Ternary::False;
    }
    match (numeric_rank(a), numeric_rank(b)) {
        (Some(x), Some(y)) => (x <= y).into(),
        // distinct non-numeric builtins are pairwise disjoint and non-empty
        _ => Ternary::False,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::{
        builtin, comprehend, difference, finite, intersect, list_of, mapping_of, power, tuple_of,
        union,
    };
    use crate::symbolic::{call, int, var};
    use crate::value::FunctionValue;
    use std::sync::Arc;

    fn defs() -> Definitions {
        Definitions::new()
    }

    #[test]
    fn builtin_membership() {
        let defs = defs();
        let cases = [
            (BuiltinSet::Int, Value::integer(-3), Ternary::True),
            (BuiltinSet::Nat, Value::integer(0), Ternary::False),
            (BuiltinSet::Whole, Value::integer(0), Ternary::True),
            (BuiltinSet::Str, Value::str("hi"), Ternary::True),
            (BuiltinSet::Str, Value::Char('h'), Ternary::False),
            (BuiltinSet::Univ, Value::Bool(true), Ternary::True),
            (BuiltinSet::Empty, Value::integer(1), Ternary::False),
        ];
        for (kind, value, expected) in cases {
            assert_eq!(contains(&defs, &builtin(kind), &value), expected);
        }
    }

    #[test]
    fn finite_round_trip() {
        let defs = defs();
        let set = finite(vec![Value::integer(1), Value::str("hi"), Value::Bool(true)]);
        for value in [Value::integer(1), Value::str("hi"), Value::Bool(true)] {
            assert_eq!(contains(&defs, &set, &value), Ternary::True);
        }
        assert_eq!(contains(&defs, &set, &Value::integer(2)), Ternary::False);
    }

    #[test]
    fn tuple_and_power() {
        let defs = defs();
        let pair = power(builtin(BuiltinSet::Int), 2).unwrap();
        let point = Value::Tuple(vec![Value::integer(3), Value::integer(-2)]);
        assert_eq!(contains(&defs, &pair, &point), Ternary::True);
        // arity and component type both matter
        let triple = Value::Tuple(vec![Value::integer(1); 3]);
        assert_eq!(contains(&defs, &pair, &triple), Ternary::False);
        let mixed = tuple_of(vec![builtin(BuiltinSet::Int), builtin(BuiltinSet::Str)]).unwrap();
        let ok = Value::Tuple(vec![Value::integer(1), Value::str("x")]);
        let bad = Value::Tuple(vec![Value::str("x"), Value::integer(1)]);
        assert_eq!(contains(&defs, &mixed, &ok), Ternary::True);
        assert_eq!(contains(&defs, &mixed, &bad), Ternary::False);
    }

    #[test]
    fn list_membership() {
        let defs = defs();
        let ints = list_of(builtin(BuiltinSet::Int));
        assert_eq!(contains(&defs, &ints, &Value::List(vec![])), Ternary::True);
        let good = Value::List(vec![Value::integer(1), Value::integer(2)]);
        let bad = Value::List(vec![Value::integer(1), Value::str("x")]);
        assert_eq!(contains(&defs, &ints, &good), Ternary::True);
        assert_eq!(contains(&defs, &ints, &bad), Ternary::False);
    }

    #[test]
    fn algebra() {
        let defs = defs();
        let int_or_str = union(builtin(BuiltinSet::Int), builtin(BuiltinSet::Str));
        assert_eq!(contains(&defs, &int_or_str, &Value::str("a")), Ternary::True);
        assert_eq!(
            contains(&defs, &int_or_str, &Value::Bool(true)),
            Ternary::False
        );
        let evenless = difference(builtin(BuiltinSet::Int), finite(vec![Value::integer(0)]));
        assert_eq!(contains(&defs, &evenless, &Value::integer(0)), Ternary::False);
        assert_eq!(contains(&defs, &evenless, &Value::integer(7)), Ternary::True);
        let both = intersect(builtin(BuiltinSet::Int), builtin(BuiltinSet::Real));
        assert_eq!(contains(&defs, &both, &Value::integer(1)), Ternary::True);
    }

    #[test]
    fn comprehension() {
        let defs = defs();
        // {x in Int : x mod 3 == 1}
        let pred = call("eq", vec![call("mod", vec![var("x"), int(3)]), int(1)]);
        let set = comprehend(builtin(BuiltinSet::Int), "x", pred);
        assert_eq!(contains(&defs, &set, &Value::integer(4)), Ternary::True);
        assert_eq!(contains(&defs, &set, &Value::integer(5)), Ternary::False);
        // a predicate that fails to evaluate degrades to Unknown
        let broken = comprehend(builtin(BuiltinSet::Int), "x", call("frobnicate", vec![var("x")]));
        assert_eq!(contains(&defs, &broken, &Value::integer(1)), Ternary::Unknown);
    }

    #[test]
    fn mapping_membership() {
        let defs = defs();
        let int_to_real = mapping_of(builtin(BuiltinSet::Int), builtin(BuiltinSet::Real));
        let typed = Value::Function(FunctionValue::symbolic(
            vec!["x".to_string()],
            var("x"),
            Some(builtin(BuiltinSet::Nat)),
            Some(builtin(BuiltinSet::Int)),
        ));
        assert_eq!(contains(&defs, &int_to_real, &typed), Ternary::True);
        let untyped = Value::Function(FunctionValue::symbolic(
            vec!["x".to_string()],
            var("x"),
            None,
            None,
        ));
        assert_eq!(contains(&defs, &int_to_real, &untyped), Ternary::Unknown);
        let wrong = Value::Function(FunctionValue::symbolic(
            vec!["x".to_string()],
            var("x"),
            Some(builtin(BuiltinSet::Str)),
            Some(builtin(BuiltinSet::Str)),
        ));
        assert_eq!(contains(&defs, &int_to_real, &wrong), Ternary::False);
        assert_eq!(contains(&defs, &int_to_real, &Value::integer(1)), Ternary::False);
    }

    #[test]
    fn recursive_alias() {
        let mut defs = Definitions::new();
        let id = defs.declare("Tree");
        let tree = defs.alias(id);
        let node = tuple_of(vec![Arc::clone(&tree), Arc::clone(&tree)]).unwrap();
        defs.define(id, union(builtin(BuiltinSet::Int), node));

        assert_eq!(contains(&defs, &tree, &Value::integer(5)), Ternary::True);
        let nested = Value::Tuple(vec![
            Value::integer(1),
            Value::Tuple(vec![Value::integer(2), Value::integer(3)]),
        ]);
        assert_eq!(contains(&defs, &tree, &nested), Ternary::True);
        assert_eq!(contains(&defs, &tree, &Value::str("x")), Ternary::False);
    }

    #[test]
    fn pathological_alias_answers_unknown() {
        let mut defs = Definitions::new();
        let id = defs.declare("Loop");
        defs.define(id, defs.alias(id));
        let set = defs.alias(id);
        assert_eq!(contains(&defs, &set, &Value::integer(1)), Ternary::Unknown);
        // undeclared-but-undefined names are opaque too
        let opaque_id = defs.declare("Opaque");
        let opaque = defs.alias(opaque_id);
        assert_eq!(contains(&defs, &opaque, &Value::integer(1)), Ternary::Unknown);
    }

    #[test]
    fn subset_chains() {
        let defs = defs();
        let sub = subset_of(
            &defs,
            &builtin(BuiltinSet::Nat),
            &builtin(BuiltinSet::Real),
        );
        assert_eq!(sub, Ternary::True);
        assert_eq!(
            subset_of(&defs, &builtin(BuiltinSet::Int), &builtin(BuiltinSet::Nat)),
            Ternary::False
        );
        assert_eq!(
            subset_of(
                &defs,
                &finite(vec![Value::integer(1), Value::integer(2)]),
                &builtin(BuiltinSet::Nat),
            ),
            Ternary::True
        );
        assert_eq!(
            subset_of(
                &defs,
                &union(builtin(BuiltinSet::Nat), builtin(BuiltinSet::Bool)),
                &builtin(BuiltinSet::Int),
            ),
            Ternary::False
        );
    }

    #[test]
    fn bool_equals_its_literal_form() {
        let defs = defs();
        let literal = finite(vec![Value::Bool(false), Value::Bool(true)]);
        assert_eq!(
            set_eq(&defs, &builtin(BuiltinSet::Bool), &literal),
            Ternary::True
        );
        assert_eq!(
            set_eq(&defs, &builtin(BuiltinSet::Int), &builtin(BuiltinSet::Real)),
            Ternary::False
        );
    }

    #[test]
    fn zeroth_power_is_empty() {
        let defs = defs();
        let collapsed = power(builtin(BuiltinSet::Int), 0).unwrap();
        assert_eq!(
            set_eq(&defs, &collapsed, &builtin(BuiltinSet::Empty)),
            Ternary::True
        );
    }

    #[test]
    fn oracle_is_stable() {
        let defs = defs();
        let set = union(
            builtin(BuiltinSet::Int),
            comprehend(
                builtin(BuiltinSet::Str),
                "s",
                call("eq", vec![var("s"), var("s")]),
            ),
        );
        let value = Value::str("same");
        let first = contains(&defs, &set, &value);
        for _ in 0..3 {
            assert_eq!(contains(&defs, &set, &value), first);
        }
    }
}
