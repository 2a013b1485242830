//! Intention index
//!
//! Holds the set of accepted intentions for a control plane. Every write goes through
//! [`Index::apply`], which:
//!
//! - authorizes the caller against both ends of the intention (and, for updates and deletes,
//!   against the stored intention as well);
//! - validates the intention before it is stored;
//! - refuses a second intention for the same source and destination;
//! - ignores updates that do not change the intention's hash.
//!
//! Reads return intentions in precedence order, which is the order in which proxies must evaluate
//! them.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod index;
pub mod metrics;


pub use self::{
    index::{Applied, Error, Index, MatchType, Op, SharedIndex},
    metrics::IndexMetrics,
};
