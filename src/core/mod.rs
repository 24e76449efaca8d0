//! Deterministic Primitives
//!
//! Canonical hashing and the descriptive statistics the validator relies on.

pub mod hash;
pub mod stats;

pub use hash::{CanonicalHasher, Digest32};
