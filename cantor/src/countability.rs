use crate::set::{BuiltinSet, Definitions, SetExpr, MAX_ALIAS_DEPTH};
use crate::ternary::Ternary;

/// Whether a set's elements fit in a complete, index-addressable sequence.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Countability {
    Countable,
    Uncountable,
    Unknown,
}

/// Cardinality on the finite/infinite axis, used by the `Mapping` rules.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Finiteness {
    Finite,
    Infinite,
    Unknown,
}

/// Classifies a set expression bottom-up against a fixed rule table.
///
/// Sound in the same sense as the membership oracle: `Unknown` is the answer
/// whenever the table cannot decide (two uncountable operands meeting in an
/// intersection, a refinement of an uncountable base, an opaque alias).
pub fn classify(defs: &Definitions, set: &SetExpr) -> Countability {
    classify_at(defs, set, 0)
}

/// Whether the set has finitely many elements, where decidable.
pub fn finiteness(defs: &Definitions, set: &SetExpr) -> Finiteness {
    finiteness_at(defs, set, 0)
}

fn classify_at(defs: &Definitions, set: &SetExpr, depth: usize) -> Countability {
    use Countability::*;
    match set {
        SetExpr::Builtin(kind) => match kind {
            BuiltinSet::Real | BuiltinSet::Complex | BuiltinSet::Univ => Uncountable,
            _ => Countable,
        },
        SetExpr::Finite(_) => Countable,
        SetExpr::Tuple(_) | SetExpr::Power(..) => {
            // components() is total on these two variants
            let components = set.components().unwrap_or_default();
            classify_product(defs, &components, depth)
        }
        SetExpr::ListOf(element) => match classify_at(defs, element, depth) {
            Countable => Countable,
            Uncountable => Uncountable,
            Unknown => Unknown,
        },
        SetExpr::Mapping(domain, codomain) => classify_mapping(defs, domain, codomain, depth),
        SetExpr::Union(a, b) => {
            match (classify_at(defs, a, depth), classify_at(defs, b, depth)) {
                (Countable, Countable) => Countable,
                // a union contains each operand as a subset
                (Uncountable, _) | (_, Uncountable) => Uncountable,
                _ => Unknown,
            }
        }
        SetExpr::Intersection(a, b) => {
            // a subset of a countable set is countable
            match (classify_at(defs, a, depth), classify_at(defs, b, depth)) {
                (Countable, _) | (_, Countable) => Countable,
                _ => Unknown,
            }
        }
        SetExpr::Difference(a, b) => {
            match (classify_at(defs, a, depth), classify_at(defs, b, depth)) {
                (Countable, _) => Countable,
                // removing countably many points cannot make it countable
                (Uncountable, Countable) => Uncountable,
                _ => Unknown,
            }
        }
        SetExpr::Comprehension { base, .. } => match classify_at(defs, base, depth) {
            Countable => Countable,
            // a refinement of an uncountable base may itself be countable
            _ => Unknown,
        },
        SetExpr::Alias { id, .. } => {
            if depth >= MAX_ALIAS_DEPTH {
                return Unknown;
            }
            match defs.resolve(*id) {
                Some(definition) => classify_at(defs, definition, depth + 1),
                None => Unknown,
            }
        }
    }
}

fn classify_product(
    defs: &Definitions,
    components: &[std::sync::Arc<SetExpr>],
    depth: usize,
) -> Countability {
    use Countability::*;
    if components
        .iter()
        .any(|component| component.is_syntactically_empty())
    {
        return Countable;
    }
    let mut result = Countable;
    for component in components {
        match classify_at(defs, component, depth) {
            Countable => {}
            Uncountable => {
                // only blows up if every other factor actually has elements
                let rest_nonempty = components
                    .iter()
                    .all(|other| provably_nonempty(defs, other, depth));
                return if rest_nonempty { Uncountable } else { Unknown };
            }
            Unknown => result = Unknown,
        }
    }
    result
}

fn classify_mapping(
    defs: &Definitions,
    domain: &SetExpr,
    codomain: &SetExpr,
    depth: usize,
) -> Countability {
    use Countability::*;
    // a trivial codomain or empty domain leaves at most one function
    if domain.is_syntactically_empty() || codomain.is_syntactically_empty() {
        return Countable;
    }
    let plural_codomain = has_at_least_two(defs, codomain, depth);
    match finiteness_at(defs, domain, depth) {
        Finiteness::Finite => match classify_at(defs, codomain, depth) {
            Countable => Countable,
            Uncountable if plural_codomain.is_true() => Uncountable,
            _ => Unknown,
        },
        Finiteness::Infinite => match (classify_at(defs, domain, depth), plural_codomain) {
            // the diagonal argument, e.g. Int -> Bool
            (Countable, Ternary::True) => Uncountable,
            (Uncountable, Ternary::True) => Uncountable,
            (_, Ternary::False) => Countable,
            _ => Unknown,
        },
        Finiteness::Unknown => Unknown,
    }
}

fn finiteness_at(defs: &Definitions, set: &SetExpr, depth: usize) -> Finiteness {
    use Finiteness::*;
    match set {
        SetExpr::Builtin(kind) => match kind {
            BuiltinSet::Bool | BuiltinSet::Char | BuiltinSet::Empty => Finite,
            _ => Infinite,
        },
        SetExpr::Finite(_) => Finite,
        SetExpr::Tuple(_) | SetExpr::Power(..) => {
            let components = set.components().unwrap_or_default();
            if components
                .iter()
                .any(|component| component.is_syntactically_empty())
            {
                return Finite;
            }
            let mut result = Finite;
            for component in &components {
                match finiteness_at(defs, component, depth) {
                    Finite => {}
                    Infinite => {
                        let rest_nonempty = components
                            .iter()
                            .all(|other| provably_nonempty(defs, other, depth));
                        return if rest_nonempty { Infinite } else { Unknown };
                    }
                    Unknown => result = Unknown,
                }
            }
            result
        }
        SetExpr::ListOf(element) => {
            if element.is_syntactically_empty() {
                // only the empty list
                Finite
            } else if provably_nonempty(defs, element, depth) {
                Infinite
            } else {
                Unknown
            }
        }
        SetExpr::Mapping(domain, codomain) => {
            if domain.is_syntactically_empty() || codomain.is_syntactically_empty() {
                return Finite;
            }
            match (
                finiteness_at(defs, domain, depth),
                finiteness_at(defs, codomain, depth),
            ) {
                (Finite, Finite) => Finite,
                (Infinite, _) if has_at_least_two(defs, codomain, depth).is_true() => Infinite,
                (_, Infinite) if provably_nonempty(defs, domain, depth) => Infinite,
                _ => Unknown,
            }
        }
        SetExpr::Union(a, b) => {
            match (finiteness_at(defs, a, depth), finiteness_at(defs, b, depth)) {
                (Finite, Finite) => Finite,
                (Infinite, _) | (_, Infinite) => Infinite,
                _ => Unknown,
            }
        }
        SetExpr::Intersection(a, b) => {
            match (finiteness_at(defs, a, depth), finiteness_at(defs, b, depth)) {
                (Finite, _) | (_, Finite) => Finite,
                _ => Unknown,
            }
        }
        SetExpr::Difference(a, b) => {
            match (finiteness_at(defs, a, depth), finiteness_at(defs, b, depth)) {
                (Finite, _) => Finite,
                (Infinite, Finite) => Infinite,
                _ => Unknown,
            }
        }
        SetExpr::Comprehension { base, .. } => match finiteness_at(defs, base, depth) {
            Finite => Finite,
            _ => Unknown,
        },
        SetExpr::Alias { id, .. } => {
            if depth >= MAX_ALIAS_DEPTH {
                return Unknown;
            }
            match defs.resolve(*id) {
                Some(definition) => finiteness_at(defs, definition, depth + 1),
                None => Unknown,
            }
        }
    }
}

/// Conservative non-emptiness: `false` means "could not prove it".
fn provably_nonempty(defs: &Definitions, set: &SetExpr, depth: usize) -> bool {
    match set {
        SetExpr::Builtin(kind) => *kind != BuiltinSet::Empty,
        SetExpr::Finite(items) => !items.is_empty(),
        SetExpr::Tuple(_) | SetExpr::Power(..) => set
            .components()
            .unwrap_or_default()
            .iter()
            .all(|component| provably_nonempty(defs, component, depth)),
        // the empty list is always an element
        SetExpr::ListOf(_) => true,
        SetExpr::Mapping(domain, codomain) => {
            domain.is_syntactically_empty() || provably_nonempty(defs, codomain, depth)
        }
        SetExpr::Union(a, b) => {
            provably_nonempty(defs, a, depth) || provably_nonempty(defs, b, depth)
        }
        SetExpr::Alias { id, .. } => {
            depth < MAX_ALIAS_DEPTH
                && defs
                    .resolve(*id)
                    .is_some_and(|definition| provably_nonempty(defs, definition, depth + 1))
        }
        _ => false,
    }
}

/// Whether the set provably holds at least two distinct elements.
fn has_at_least_two(defs: &Definitions, set: &SetExpr, depth: usize) -> Ternary {
    match set {
        SetExpr::Builtin(BuiltinSet::Empty) => Ternary::False,
        SetExpr::Builtin(_) => Ternary::True,
        SetExpr::Finite(items) => (items.len() >= 2).into(),
        SetExpr::Tuple(_) | SetExpr::Power(..) => {
            let components = set.components().unwrap_or_default();
            if components
                .iter()
                .any(|component| component.is_syntactically_empty())
            {
                return Ternary::False;
            }
            let all_nonempty = components
                .iter()
                .all(|component| provably_nonempty(defs, component, depth));
            let any_plural = components
                .iter()
                .any(|component| has_at_least_two(defs, component, depth).is_true());
            if all_nonempty && any_plural {
                Ternary::True
            } else {
                Ternary::Unknown
            }
        }
        SetExpr::ListOf(element) => {
            if element.is_syntactically_empty() {
                Ternary::False
            } else if provably_nonempty(defs, element, depth) {
                Ternary::True
            } else {
                Ternary::Unknown
            }
        }
        SetExpr::Union(a, b) => {
            if has_at_least_two(defs, a, depth).is_true()
                || has_at_least_two(defs, b, depth).is_true()
            {
                Ternary::True
            } else {
                Ternary::Unknown
            }
        }
        SetExpr::Alias { id, .. } => {
            if depth >= MAX_ALIAS_DEPTH {
                return Ternary::Unknown;
            }
            match defs.resolve(*id) {
                Some(definition) => has_at_least_two(defs, definition, depth + 1),
                None => Ternary::Unknown,
            }
        }
        _ => Ternary::Unknown,
    }
}
