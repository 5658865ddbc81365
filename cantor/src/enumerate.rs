use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use num::{BigInt, One, Zero};

use crate::countability::{classify, finiteness, Countability, Finiteness};
use crate::error::NotCountableError;
use crate::membership::contains;
use crate::set::{BuiltinSet, Definitions, SetExpr, MAX_ALIAS_DEPTH};
use crate::symbolic::{eval, Bindings, SymbolicExpr};
use crate::value::{FunctionValue, Number, Value};

/// A lazy, restartable walk over a countable set.
///
/// Completeness: every element of the set appears at some finite index.
/// Soundness: nothing outside the set is ever produced. The order is
/// deterministic for a given expression but otherwise not contractual.
/// Nothing is materialized up front; each `next` advances by one element.
pub struct Enumeration<'a> {
    defs: &'a Definitions,
    root: Enumerator,
}

/// Builds an enumeration for `set`, failing unless it classifies
/// [`Countability::Countable`].
pub fn enumerate<'a>(
    defs: &'a Definitions,
    set: &SetExpr,
) -> Result<Enumeration<'a>, NotCountableError> {
    let classification = classify(defs, set);
    if classification != Countability::Countable {
        return Err(NotCountableError {
            set: set.to_string(),
            classification,
        });
    }
    match build(defs, set, 0) {
        Some(root) => Ok(Enumeration { defs, root }),
        None => Err(NotCountableError {
            set: set.to_string(),
            classification: Countability::Unknown,
        }),
    }
}

impl Iterator for Enumeration<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        self.root.pull(self.defs)
    }
}

enum Enumerator {
    Finite {
        items: Vec<Value>,
        index: usize,
    },
    /// `start, start+1, start+2, ...` as integers.
    Ascending {
        next: BigInt,
    },
    /// Zig-zag `0, 1, -1, 2, -2, ...`.
    Integers {
        magnitude: BigInt,
        negative: bool,
    },
    /// All Unicode scalar values in codepoint order.
    Chars {
        next: u32,
    },
    /// Character lists re-read as strings.
    Strings(Box<Enumerator>),
    Product(ProductState),
    Lists(ListsState),
    Union(UnionState),
    Filtered {
        inner: Box<Enumerator>,
        filter: Filter,
    },
    Mappings(MappingState),
}

enum Filter {
    /// Keep elements provably inside the set.
    In(Arc<SetExpr>),
    /// Keep elements provably outside the set.
    NotIn(Arc<SetExpr>),
    /// Keep elements whose predicate evaluates to `true`.
    Satisfies {
        binder: String,
        predicate: Arc<SymbolicExpr>,
    },
}

fn build(defs: &Definitions, set: &SetExpr, depth: usize) -> Option<Enumerator> {
    match set {
        SetExpr::Builtin(kind) => build_builtin(*kind),
        SetExpr::Finite(items) => Some(Enumerator::Finite {
            items: items.clone(),
            index: 0,
        }),
        SetExpr::Tuple(_) | SetExpr::Power(..) => {
            let components = set.components()?;
            let factors = components
                .iter()
                .map(|component| build(defs, component, depth).map(Memo::new))
                .collect::<Option<Vec<_>>>()?;
            Some(Enumerator::Product(ProductState::new(factors)))
        }
        SetExpr::ListOf(element) => {
            // probe once so unsupported element sets fail at build time
            build(defs, element, depth)?;
            Some(Enumerator::Lists(ListsState::new(Arc::clone(element))))
        }
        SetExpr::Mapping(domain, codomain) => build_mappings(defs, domain, codomain, depth),
        SetExpr::Union(a, b) => Some(Enumerator::Union(UnionState {
            left: Box::new(build(defs, a, depth)?),
            right: Box::new(build(defs, b, depth)?),
            take_right: false,
            seen: HashSet::new(),
        })),
        SetExpr::Intersection(a, b) => {
            // walk whichever side is known countable, filter by the other
            let (walk, sieve) = if classify(defs, a) == Countability::Countable {
                (a, b)
            } else {
                (b, a)
            };
            Some(Enumerator::Filtered {
                inner: Box::new(build(defs, walk, depth)?),
                filter: Filter::In(Arc::clone(sieve)),
            })
        }
        SetExpr::Difference(a, b) => Some(Enumerator::Filtered {
            inner: Box::new(build(defs, a, depth)?),
            filter: Filter::NotIn(Arc::clone(b)),
        }),
        SetExpr::Comprehension {
            base,
            binder,
            predicate,
        } => Some(Enumerator::Filtered {
            inner: Box::new(build(defs, base, depth)?),
            filter: Filter::Satisfies {
                binder: binder.clone(),
                predicate: Arc::clone(predicate),
            },
        }),
        SetExpr::Alias { id, .. } => {
            if depth >= MAX_ALIAS_DEPTH {
                return None;
            }
            build(defs, defs.resolve(*id)?, depth + 1)
        }
    }
}

fn build_builtin(kind: BuiltinSet) -> Option<Enumerator> {
    match kind {
        BuiltinSet::Whole => Some(Enumerator::Ascending {
            next: BigInt::zero(),
        }),
        BuiltinSet::Nat => Some(Enumerator::Ascending { next: BigInt::one() }),
        BuiltinSet::Int => Some(Enumerator::Integers {
            magnitude: BigInt::zero(),
            negative: false,
        }),
        BuiltinSet::Bool => Some(Enumerator::Finite {
            items: vec![Value::Bool(false), Value::Bool(true)],
            index: 0,
        }),
        BuiltinSet::Char => Some(Enumerator::Chars { next: 0 }),
        BuiltinSet::Str => Some(Enumerator::Strings(Box::new(Enumerator::Lists(
            ListsState::new(crate::set::builtin(BuiltinSet::Char)),
        )))),
        BuiltinSet::Empty => Some(Enumerator::Finite {
            items: Vec::new(),
            index: 0,
        }),
        BuiltinSet::Real | BuiltinSet::Complex | BuiltinSet::Univ => None,
    }
}

fn build_mappings(
    defs: &Definitions,
    domain: &Arc<SetExpr>,
    codomain: &Arc<SetExpr>,
    depth: usize,
) -> Option<Enumerator> {
    if finiteness(defs, domain) != Finiteness::Finite {
        // only countable with at most one codomain element: the space is
        // empty or holds a single constant function
        let mut probe = build(defs, codomain, depth)?;
        let Some(result) = probe.pull(defs) else {
            return Some(Enumerator::Finite {
                items: Vec::new(),
                index: 0,
            });
        };
        if probe.pull(defs).is_some() {
            return None;
        }
        let constant =
            FunctionValue::constant(result, Arc::clone(domain), Arc::clone(codomain));
        return Some(Enumerator::Finite {
            items: vec![Value::Function(constant)],
            index: 0,
        });
    }
    let mut walker = build(defs, domain, depth)?;
    let mut domain_values = Vec::new();
    while let Some(value) = walker.pull(defs) {
        domain_values.push(value);
    }
    let factors = domain_values
        .iter()
        .map(|_| build(defs, codomain, depth).map(Memo::new))
        .collect::<Option<Vec<_>>>()?;
    Some(Enumerator::Mappings(MappingState {
        domain_values,
        domain: Arc::clone(domain),
        codomain: Arc::clone(codomain),
        product: ProductState::new(factors),
    }))
}

impl Enumerator {
    fn pull(&mut self, defs: &Definitions) -> Option<Value> {
        match self {
            Self::Finite { items, index } => {
                let item = items.get(*index)?.clone();
                *index += 1;
                Some(item)
            }
            Self::Ascending { next } => {
                let value = next.clone();
                *next += 1;
                Some(Value::Number(Number::integer(value)))
            }
            Self::Integers {
                magnitude,
                negative,
            } => {
                if magnitude.is_zero() {
                    *magnitude = BigInt::one();
                    Some(Value::Number(Number::zero()))
                } else if !*negative {
                    *negative = true;
                    Some(Value::Number(Number::integer(magnitude.clone())))
                } else {
                    let value = -magnitude.clone();
                    *negative = false;
                    *magnitude += 1;
                    Some(Value::Number(Number::integer(value)))
                }
            }
            Self::Chars { next } => {
                while *next <= char::MAX as u32 {
                    let codepoint = *next;
                    *next += 1;
                    if let Some(c) = char::from_u32(codepoint) {
                        return Some(Value::Char(c));
                    }
                }
                None
            }
            Self::Strings(inner) => {
                let Value::List(items) = inner.pull(defs)? else {
                    return None;
                };
                let mut s = String::with_capacity(items.len());
                for item in &items {
                    if let Value::Char(c) = item {
                        s.push(*c);
                    }
                }
                Some(Value::Str(s))
            }
            Self::Product(product) => product.pull(defs),
            Self::Lists(lists) => lists.pull(defs),
            Self::Union(union) => union.pull(defs),
            Self::Filtered { inner, filter } => loop {
                let candidate = inner.pull(defs)?;
                if filter.admits(defs, &candidate) {
                    return Some(candidate);
                }
            },
            Self::Mappings(mappings) => mappings.pull(defs),
        }
    }
}

impl Filter {
    fn admits(&self, defs: &Definitions, candidate: &Value) -> bool {
        match self {
            // Unknown is excluded either way: only provable members pass
            Self::In(set) => contains(defs, set, candidate).is_true(),
            Self::NotIn(set) => contains(defs, set, candidate).is_false(),
            Self::Satisfies { binder, predicate } => {
                let mut bindings = Bindings::new();
                bindings.insert(binder.clone(), candidate.clone());
                matches!(eval(predicate, &bindings), Ok(Value::Bool(true)))
            }
        }
    }
}

/// A sub-enumeration with its produced prefix cached, so product walks can
/// revisit earlier indices.
struct Memo {
    source: Enumerator,
    cache: Vec<Value>,
    exhausted: bool,
}

impl Memo {
    fn new(source: Enumerator) -> Self {
        Self {
            source,
            cache: Vec::new(),
            exhausted: false,
        }
    }

    fn get(&mut self, defs: &Definitions, index: usize) -> Option<Value> {
        while self.cache.len() <= index && !self.exhausted {
            match self.source.pull(defs) {
                Some(value) => self.cache.push(value),
                None => self.exhausted = true,
            }
        }
        self.cache.get(index).cloned()
    }

    fn known_empty(&self) -> bool {
        self.exhausted && self.cache.is_empty()
    }
}

/// Anti-diagonal walk over an n-ary product: diagonal `d` visits every index
/// vector summing to `d`, so each factor index is reached at a finite step
/// even when factors are infinite.
struct ProductState {
    factors: Vec<Memo>,
    diagonal: u64,
    pending: VecDeque<Vec<usize>>,
}

impl ProductState {
    fn new(factors: Vec<Memo>) -> Self {
        Self {
            factors,
            diagonal: 0,
            pending: VecDeque::new(),
        }
    }

    fn pull(&mut self, defs: &Definitions) -> Option<Value> {
        loop {
            while let Some(indices) = self.pending.pop_front() {
                if let Some(items) = self.fetch(defs, &indices) {
                    return Some(Value::Tuple(items));
                }
            }
            if self.done() {
                return None;
            }
            self.pending = compositions(self.diagonal, self.factors.len());
            self.diagonal += 1;
        }
    }

    /// Index vectors past which no further tuple can exist: all factors are
    /// known finite and the diagonal exceeds the last reachable one.
    fn done(&self) -> bool {
        if self.factors.iter().any(Memo::known_empty) {
            return true;
        }
        if !self.factors.iter().all(|factor| factor.exhausted) {
            return false;
        }
        let last: u64 = self
            .factors
            .iter()
            .map(|factor| (factor.cache.len() - 1) as u64)
            .sum();
        self.diagonal > last
    }

    fn fetch(&mut self, defs: &Definitions, indices: &[usize]) -> Option<Vec<Value>> {
        let mut items = Vec::with_capacity(indices.len());
        for (factor, &index) in self.factors.iter_mut().zip(indices) {
            items.push(factor.get(defs, index)?);
        }
        Some(items)
    }
}

/// All vectors of `parts` non-negative integers summing to `total`.
fn compositions(total: u64, parts: usize) -> VecDeque<Vec<usize>> {
    let mut out = VecDeque::new();
    let mut current = Vec::with_capacity(parts);
    fill_compositions(total, parts, &mut current, &mut out);
    out
}

fn fill_compositions(
    remaining: u64,
    parts: usize,
    current: &mut Vec<usize>,
    out: &mut VecDeque<Vec<usize>>,
) {
    match parts {
        0 => {
            if remaining == 0 {
                out.push_back(current.clone());
            }
        }
        1 => {
            current.push(remaining as usize);
            out.push_back(current.clone());
            current.pop();
        }
        _ => {
            for head in 0..=remaining {
                current.push(head as usize);
                fill_compositions(remaining - head, parts - 1, current, out);
                current.pop();
            }
        }
    }
}

/// Lists of every finite length, walked along the `(length, index)` diagonal
/// so no single length starves the others.
struct ListsState {
    element: Arc<SetExpr>,
    /// `per_length[n]` memoizes the product of `n` element copies.
    per_length: Vec<Memo>,
    diagonal: u64,
    offset: u64,
}

impl ListsState {
    fn new(element: Arc<SetExpr>) -> Self {
        Self {
            element,
            per_length: Vec::new(),
            diagonal: 0,
            offset: 0,
        }
    }

    fn pull(&mut self, defs: &Definitions) -> Option<Value> {
        loop {
            if self.offset > self.diagonal {
                // an empty element set leaves nothing beyond the empty list
                if self
                    .per_length
                    .get(1)
                    .is_some_and(Memo::known_empty)
                {
                    return None;
                }
                self.diagonal += 1;
                self.offset = 0;
            }
            let length = self.offset as usize;
            let index = (self.diagonal - self.offset) as usize;
            self.offset += 1;

            while self.per_length.len() <= length {
                let copies = self.per_length.len();
                let Some(product) = self.length_product(defs, copies) else {
                    return None;
                };
                self.per_length.push(Memo::new(product));
            }
            if let Some(Value::Tuple(items)) = self.per_length[length].get(defs, index) {
                return Some(Value::List(items));
            }
        }
    }

    fn length_product(&self, defs: &Definitions, copies: usize) -> Option<Enumerator> {
        let factors = (0..copies)
            .map(|_| build(defs, &self.element, 0).map(Memo::new))
            .collect::<Option<Vec<_>>>()?;
        Some(Enumerator::Product(ProductState::new(factors)))
    }
}

struct UnionState {
    left: Box<Enumerator>,
    right: Box<Enumerator>,
    take_right: bool,
    /// Elements already produced; overlap between the sides is suppressed.
    seen: HashSet<Value>,
}

impl UnionState {
    fn pull(&mut self, defs: &Definitions) -> Option<Value> {
        loop {
            let candidate = if self.take_right {
                self.right
                    .pull(defs)
                    .or_else(|| self.left.pull(defs))
            } else {
                self.left
                    .pull(defs)
                    .or_else(|| self.right.pull(defs))
            };
            self.take_right = !self.take_right;
            let candidate = candidate?;
            if self.seen.insert(candidate.clone()) {
                return Some(candidate);
            }
        }
    }
}

/// Functions from a finite domain, produced as explicit graphs: one function
/// per tuple of codomain choices.
struct MappingState {
    domain_values: Vec<Value>,
    domain: Arc<SetExpr>,
    codomain: Arc<SetExpr>,
    product: ProductState,
}

impl MappingState {
    fn pull(&mut self, defs: &Definitions) -> Option<Value> {
        let Value::Tuple(outputs) = self.product.pull(defs)? else {
            return None;
        };
        let pairs = self
            .domain_values
            .iter()
            .cloned()
            .zip(outputs)
            .collect();
        Some(Value::Function(FunctionValue::graph(
            pairs,
            Arc::clone(&self.domain),
            Arc::clone(&self.codomain),
        )))
    }
}
