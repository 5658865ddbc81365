use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::TypeConstructionError;
use crate::symbolic::SymbolicExpr;
use crate::value::Value;

/// A builtin set, usable directly as a type.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum BuiltinSet {
    Whole,
    Nat,
    Int,
    Real,
    Complex,
    Str,
    Char,
    Bool,
    Univ,
    Empty,
}

impl BuiltinSet {
    pub fn name(self) -> &'static str {
        match self {
            Self::Whole => "Whole",
            Self::Nat => "Nat",
            Self::Int => "Int",
            Self::Real => "Real",
            Self::Complex => "Complex",
            Self::Str => "Str",
            Self::Char => "Char",
            Self::Bool => "Bool",
            Self::Univ => "Univ",
            Self::Empty => "Empty",
        }
    }
}

/// Index of a named alias into a [`Definitions`] table.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct AliasId(usize);

/// A set-as-type, represented as a composable expression.
///
/// Immutable once constructed; subtrees are shared through [`Arc`]. Infinite
/// sets are never materialized: every query over a [`SetExpr`] is structural.
/// Algebra forms (`Union`, `Intersection`, `Difference`) are kept as written
/// rather than eagerly normalized; the oracle and classifier interpret them.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum SetExpr {
    Builtin(BuiltinSet),
    /// An explicit literal set; ordered and deduplicated.
    Finite(Vec<Value>),
    /// A fixed-arity product of (possibly heterogeneous) component sets.
    Tuple(Vec<Arc<SetExpr>>),
    /// `n`-fold product of one base set. `n >= 2` after construction; the
    /// [`power`] constructor folds `0` into `Empty` and `1` into the base.
    Power(Arc<SetExpr>, u32),
    /// Variable-length sequences over one element set.
    ListOf(Arc<SetExpr>),
    /// The set of functions from `domain` into `codomain`.
    Mapping(Arc<SetExpr>, Arc<SetExpr>),
    Union(Arc<SetExpr>, Arc<SetExpr>),
    Intersection(Arc<SetExpr>, Arc<SetExpr>),
    Difference(Arc<SetExpr>, Arc<SetExpr>),
    /// Elements of `base` for which `predicate` holds with `binder` bound to
    /// the candidate. The base is never pre-enumerated.
    Comprehension {
        base: Arc<SetExpr>,
        binder: String,
        predicate: Arc<SymbolicExpr>,
    },
    /// A `data`-declared name, resolved lazily through the definition table.
    /// The indirection is what lets recursive declarations exist without
    /// recursive structural embedding.
    Alias { name: String, id: AliasId },
}

pub fn builtin(kind: BuiltinSet) -> Arc<SetExpr> {
    Arc::new(SetExpr::Builtin(kind))
}

/// Builds a literal set, deduplicating while preserving first-seen order.
pub fn finite(elements: Vec<Value>) -> Arc<SetExpr> {
    let mut unique: Vec<Value> = Vec::with_capacity(elements.len());
    for element in elements {
        if !unique.contains(&element) {
            unique.push(element);
        }
    }
    Arc::new(SetExpr::Finite(unique))
}

/// A fixed-arity product. Zero declared arity is rejected; the empty product
/// is spelled `power(base, 0)`, which is `Empty`.
pub fn tuple_of(components: Vec<Arc<SetExpr>>) -> Result<Arc<SetExpr>, TypeConstructionError> {
    if components.is_empty() {
        return Err(TypeConstructionError::EmptyTuple);
    }
    Ok(Arc::new(SetExpr::Tuple(components)))
}

/// The `n`-fold product of `base`. Negative `n` is invalid; `0` denotes
/// `Empty` and `1` denotes `base` itself.
pub fn power(base: Arc<SetExpr>, n: i64) -> Result<Arc<SetExpr>, TypeConstructionError> {
    match n {
        n if n < 0 => Err(TypeConstructionError::NegativePower(n)),
        0 => Ok(builtin(BuiltinSet::Empty)),
        1 => Ok(base),
        n => Ok(Arc::new(SetExpr::Power(base, n as u32))),
    }
}

pub fn list_of(element: Arc<SetExpr>) -> Arc<SetExpr> {
    Arc::new(SetExpr::ListOf(element))
}

pub fn mapping_of(domain: Arc<SetExpr>, codomain: Arc<SetExpr>) -> Arc<SetExpr> {
    Arc::new(SetExpr::Mapping(domain, codomain))
}

pub fn union(a: Arc<SetExpr>, b: Arc<SetExpr>) -> Arc<SetExpr> {
    Arc::new(SetExpr::Union(a, b))
}

pub fn intersect(a: Arc<SetExpr>, b: Arc<SetExpr>) -> Arc<SetExpr> {
    Arc::new(SetExpr::Intersection(a, b))
}

pub fn difference(a: Arc<SetExpr>, b: Arc<SetExpr>) -> Arc<SetExpr> {
    Arc::new(SetExpr::Difference(a, b))
}

pub fn comprehend(
    base: Arc<SetExpr>,
    binder: impl Into<String>,
    predicate: Arc<SymbolicExpr>,
) -> Arc<SetExpr> {
    Arc::new(SetExpr::Comprehension {
        base,
        binder: binder.into(),
        predicate,
    })
}

impl SetExpr {
    /// Whether this is syntactically the empty set.
    pub fn is_syntactically_empty(&self) -> bool {
        match self {
            Self::Builtin(BuiltinSet::Empty) => true,
            Self::Finite(items) => items.is_empty(),
            Self::Power(_, 0) => true,
            _ => false,
        }
    }

    /// The component sets of a product form, expanding powers.
    pub fn components(&self) -> Option<Vec<Arc<SetExpr>>> {
        match self {
            Self::Tuple(components) => Some(components.clone()),
            Self::Power(base, n) => Some(vec![Arc::clone(base); *n as usize]),
            _ => None,
        }
    }
}

/// Depth budget for chasing aliases; queries that exceed it answer `Unknown`
/// rather than looping on pathological recursive declarations.
pub const MAX_ALIAS_DEPTH: usize = 64;

struct Entry {
    name: String,
    set: Option<Arc<SetExpr>>,
}

/// The table backing [`SetExpr::Alias`].
///
/// Append-only: a name is declared once (which reserves its id, so a
/// definition may refer to itself) and then defined once. A declared but
/// never defined alias is fully opaque and every query over it answers
/// `Unknown`.
#[derive(Default)]
pub struct Definitions {
    entries: Vec<Entry>,
    by_name: HashMap<String, AliasId>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves an id for `name`, returning the existing id if already
    /// declared.
    pub fn declare(&mut self, name: &str) -> AliasId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = AliasId(self.entries.len());
        self.entries.push(Entry {
            name: name.to_string(),
            set: None,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Binds a declared id to its definition.
    pub fn define(&mut self, id: AliasId, set: Arc<SetExpr>) {
        self.entries[id.0].set = Some(set);
    }

    /// Declares and defines in one step.
    pub fn insert(&mut self, name: &str, set: Arc<SetExpr>) -> AliasId {
        let id = self.declare(name);
        self.define(id, set);
        id
    }

    pub fn resolve(&self, id: AliasId) -> Option<&Arc<SetExpr>> {
        self.entries.get(id.0).and_then(|entry| entry.set.as_ref())
    }

    pub fn lookup(&self, name: &str) -> Option<AliasId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: AliasId) -> &str {
        &self.entries[id.0].name
    }

    /// An alias expression for a declared name.
    pub fn alias(&self, id: AliasId) -> Arc<SetExpr> {
        Arc::new(SetExpr::Alias {
            name: self.name_of(id).to_string(),
            id,
        })
    }
}

impl fmt::Display for SetExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(kind) => write!(f, "{}", kind.name()),
            Self::Finite(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Self::Tuple(components) => {
                write!(f, "(")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{component}")?;
                }
                write!(f, ")")
            }
            Self::Power(base, n) => write!(f, "{base}^{n}"),
            Self::ListOf(element) => write!(f, "[{element}]"),
            Self::Mapping(domain, codomain) => write!(f, "{domain} -> {codomain}"),
            Self::Union(a, b) => write!(f, "{a} | {b}"),
            Self::Intersection(a, b) => write!(f, "{a} & {b}"),
            Self::Difference(a, b) => write!(f, "{a} \\ {b}"),
            Self::Comprehension {
                base,
                binder,
                predicate,
            } => write!(f, "{{{binder} in {base} : {predicate}}}"),
            Self::Alias { name, .. } => write!(f, "{name}"),
        }
    }
}
