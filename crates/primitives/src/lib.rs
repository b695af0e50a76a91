//! Core types for the profile namespace: keys, namespaces, and the bounded
//! fixed-point primitive shared by every resolution loop.

/// Bounded fixed-point iteration.
pub mod fixed_point;
/// Dot-delimited profile keys.
pub mod key;
/// Document-scoped namespace identifiers.
pub mod namespace;

pub use fixed_point::{Convergence, DEFAULT_ITERATION_CAP, iterate_bounded};
pub use key::{KeyError, ProfileKey, SEPARATOR, Segment};
pub use namespace::Namespace;
