use crate::{hash, precedence, IntentionHash, ServicePattern};
use anyhow::{anyhow, Error, Result};
use chrono::{offset::Utc, DateTime};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, num::NonZeroU16};

/// Uniquely identifies an intention. Assigned on creation and never changed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentionId(String);

/// Whether matching connections are permitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Allow,
    Deny,
}

/// Identifies the kind of system that describes an intention's source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// The source is a service known to the mesh.
    Consul,
}

/// The user-supplied fields of an intention.
///
/// Values are kept exactly as they were provided so that they can be validated (and hashed)
/// before being accepted. The wildcard `*` may be used as a namespace or name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct IntentionSpec {
    pub description: String,

    #[serde(rename = "SourceNS")]
    pub source_ns: String,
    pub source_name: String,

    #[serde(rename = "DestinationNS")]
    pub destination_ns: String,
    pub destination_name: String,

    pub source_type: String,
    pub action: String,

    /// Fallback endpoint for the destination.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_addr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_port: Option<NonZeroU16>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

/// An accepted intention.
///
/// The precedence and hash are derived from the spec and are recomputed whenever the spec is
/// replaced, so the spec is only exposed immutably.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Intention {
    #[serde(rename = "ID")]
    id: IntentionId,

    #[serde(flatten)]
    spec: IntentionSpec,

    precedence: u32,
    hash: IntentionHash,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// === impl IntentionId ===

impl IntentionId {
    /// Generates a new random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IntentionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for IntentionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for IntentionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// === impl Action ===

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl std::str::FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            s => Err(anyhow!("invalid action: {:?}", s)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

// === impl SourceType ===

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consul => "consul",
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "consul" => Ok(Self::Consul),
            s => Err(anyhow!("invalid source type: {:?}", s)),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

// === impl IntentionSpec ===

impl IntentionSpec {
    /// Builds a spec for the given endpoints, in `namespace/name` form, with the default source
    /// type.
    pub fn new(source: (&str, &str), destination: (&str, &str), action: Action) -> Self {
        Self {
            source_ns: source.0.to_string(),
            source_name: source.1.to_string(),
            destination_ns: destination.0.to_string(),
            destination_name: destination.1.to_string(),
            source_type: SourceType::Consul.to_string(),
            action: action.to_string(),
            ..Default::default()
        }
    }

    pub fn source(&self) -> ServicePattern<'_> {
        ServicePattern::new(&self.source_ns, &self.source_name)
    }

    pub fn destination(&self) -> ServicePattern<'_> {
        ServicePattern::new(&self.destination_ns, &self.destination_name)
    }

    /// The (source namespace, source name, destination namespace, destination name) tuple that
    /// identifies which connections the intention applies to.
    pub fn key(&self) -> (&str, &str, &str, &str) {
        (
            &self.source_ns,
            &self.source_name,
            &self.destination_ns,
            &self.destination_name,
        )
    }

    /// Parses the action, if it is valid.
    pub fn parsed_action(&self) -> Option<Action> {
        self.action.parse().ok()
    }

    pub fn parsed_source_type(&self) -> Option<SourceType> {
        self.source_type.parse().ok()
    }
}

// === impl Intention ===

impl Intention {
    /// Stamps a spec with its precedence and hash. The spec is not validated.
    pub fn new(id: IntentionId, spec: IntentionSpec) -> Self {
        let now = Utc::now();
        let precedence = precedence::weight(&spec);
        let hash = hash::compute(&id, &spec, precedence);
        Self {
            id,
            spec,
            precedence,
            hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the spec, recomputing the derived fields.
    ///
    /// Returns false (leaving the intention untouched) when the new spec is identical to the
    /// current one. Matching hashes alone are not enough: fields are hashed without delimiters, so
    /// shifting bytes between adjacent fields does not change the digest.
    pub fn update(&mut self, spec: IntentionSpec) -> bool {
        let precedence = precedence::weight(&spec);
        let hash = hash::compute(&self.id, &spec, precedence);
        if hash == self.hash && spec == self.spec {
            return false;
        }

        self.spec = spec;
        self.precedence = precedence;
        self.hash = hash;
        self.updated_at = Utc::now();
        true
    }

    pub fn id(&self) -> &IntentionId {
        &self.id
    }

    pub fn spec(&self) -> &IntentionSpec {
        &self.spec
    }

    pub fn precedence(&self) -> u32 {
        self.precedence
    }

    pub fn hash(&self) -> &IntentionHash {
        &self.hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl AsRef<Intention> for Intention {
    fn as_ref(&self) -> &Intention {
        self
    }
}
