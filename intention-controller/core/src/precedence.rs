//! Orders intentions from most to least specific.
//!
//! Each intention is weighted by how many of its namespace and name components are exact. The
//! destination dominates: any intention with a more specific destination outranks every intention
//! with a less specific one, and the source only orders intentions that share a destination
//! specificity. This yields nine weights:
//!
//! ```text
//!  src   dst   weight
//! ns/n  ns/n      9
//! ns/*  ns/n      8
//!  */*  ns/n      7
//! ns/n  ns/*      6
//! ns/*  ns/*      5
//!  */*  ns/*      4
//! ns/n   */*      3
//! ns/*   */*      2
//!  */*   */*      1
//! ```
//!
//! Intentions with equal weights are ordered by their (source namespace, source name, destination
//! namespace, destination name) tuple so that the order is total.

use crate::{Intention, IntentionSpec};
use std::cmp::Ordering;

/// Computes the precedence of a spec. Higher values are evaluated first.
pub fn weight(spec: &IntentionSpec) -> u32 {
    3 * spec.destination().exact_count() + spec.source().exact_count() + 1
}

/// Compares intentions in evaluation order: higher precedence first, then by ascending
/// (source namespace, source name, destination namespace, destination name).
pub fn cmp(a: &Intention, b: &Intention) -> Ordering {
    b.precedence()
        .cmp(&a.precedence())
        .then_with(|| a.spec().key().cmp(&b.spec().key()))
}

/// Sorts intentions in evaluation order.
pub fn sort<T: AsRef<Intention>>(intentions: &mut [T]) {
    intentions.sort_by(|a, b| cmp(a.as_ref(), b.as_ref()));
}
