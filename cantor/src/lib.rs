//! A set/type engine: sets as composable expressions, a ternary membership
//! oracle, a countability classifier with a lazy enumerator for countable
//! sets, and a symbolic expression engine with structural differentiation.

pub mod annotation;
pub mod binder;
pub mod countability;
pub mod enumerate;
pub mod error;
pub mod membership;
pub mod set;
pub mod symbolic;
pub mod ternary;
pub mod value;

pub use annotation::{resolve_type_annotation, TypeAnnotation};
pub use countability::{classify, Countability};
pub use enumerate::{enumerate, Enumeration};
pub use membership::{contains, set_eq, subset_of};
pub use symbolic::differentiate;
pub use ternary::Ternary;
