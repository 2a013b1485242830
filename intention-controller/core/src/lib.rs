//! Core types for mesh intentions.
//!
//! An intention states whether a source service may open mutual-TLS connections to a destination
//! service. Both endpoints are described by a [`ServicePattern`]: a namespace and a name, each of
//! which is either an exact value or the wildcard `*`. Several intentions may apply to the same
//! pair of services, so every intention carries a precedence and intentions are evaluated in
//! [`precedence`] order: the most specific rule wins.
//!
//! ```text
//! [ IntentionSpec ] -> validate -> [ Intention { precedence, hash } ] -> precedence::sort
//! ```
//!
//! Everything in this crate is pure and synchronous.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod acl;
mod enterprise;
mod hash;
mod intention;
mod pattern;
pub mod precedence;
mod validate;

pub use self::{
    acl::{Access, AllowAll, Authorizer, AuthorizerContext, PolicyAuthorizer},
    enterprise::{DefaultMeta, EnterpriseMeta, Endpoint, DEFAULT_NAMESPACE},
    hash::IntentionHash,
    intention::{Action, Intention, IntentionId, IntentionSpec, SourceType},
    pattern::{Component, ServicePattern},
    validate::{Field, ValidationError, DESCRIPTION_MAX_LEN},
};

/// Matches any namespace or service name.
pub const WILDCARD: &str = "*";
