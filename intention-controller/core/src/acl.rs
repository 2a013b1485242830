//! Decides whether a caller may view or modify an intention.
//!
//! Access to intentions is granted per service by an [`Authorizer`]. Reading an intention requires
//! at least read access to either of its services; modifying it requires write access to both.

use crate::{DefaultMeta, EnterpriseMeta, Endpoint, Intention, IntentionSpec, WILDCARD};
use anyhow::{anyhow, Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// The access granted to the intentions of a service.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Deny,
    Read,
    Write,
}

/// Scopes an authorization check. Empty in a single-namespace deployment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AuthorizerContext {
    pub namespace: Option<String>,
    pub partition: Option<String>,
}

/// Answers which access the caller has to the intentions of a service.
pub trait Authorizer {
    /// Returns the caller's access to intentions for `service`.
    ///
    /// `service` may be the wildcard `*`, in which case the access must hold for all services.
    fn intentions(&self, service: &str, ctx: &AuthorizerContext) -> Access;
}

/// Grants write access to everything. Used when ACLs are disabled.
#[derive(Copy, Clone, Debug, Default)]
pub struct AllowAll;

/// An [`Authorizer`] backed by per-service rules.
///
/// An exact service rule takes priority over prefix rules, and the longest matching prefix rule
/// takes priority over shorter ones. Services matched by no rule get the `default` access.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyAuthorizer {
    pub default: Access,
    pub services: BTreeMap<String, Access>,
    pub service_prefixes: BTreeMap<String, Access>,
}

// === impl Access ===

impl Access {
    /// Indicates whether this access is at least `required`.
    pub fn allows(self, required: Access) -> bool {
        self >= required
    }
}

impl std::str::FromStr for Access {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deny" => Ok(Self::Deny),
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            s => Err(anyhow!("invalid access: {:?}", s)),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deny => "deny".fmt(f),
            Self::Read => "read".fmt(f),
            Self::Write => "write".fmt(f),
        }
    }
}

// === impl AllowAll ===

impl Authorizer for AllowAll {
    fn intentions(&self, _service: &str, _ctx: &AuthorizerContext) -> Access {
        Access::Write
    }
}

// === impl PolicyAuthorizer ===

impl PolicyAuthorizer {
    pub fn new(default: Access) -> Self {
        Self {
            default,
            ..Default::default()
        }
    }

    pub fn with_service(mut self, name: impl Into<String>, access: Access) -> Self {
        self.services.insert(name.into(), access);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, access: Access) -> Self {
        self.service_prefixes.insert(prefix.into(), access);
        self
    }

    fn lookup(&self, service: &str) -> Access {
        if let Some(access) = self.services.get(service) {
            return *access;
        }

        self.service_prefixes
            .iter()
            .filter(|(prefix, _)| service.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, access)| *access)
            .unwrap_or(self.default)
    }

    fn rules(&self) -> impl Iterator<Item = Access> + '_ {
        self.services
            .values()
            .chain(self.service_prefixes.values())
            .copied()
    }

    /// Every service is granted `required` only if the catch-all grants it and no rule narrows it.
    fn all_allow(&self, required: Access) -> bool {
        let catch_all = self
            .service_prefixes
            .get("")
            .copied()
            .unwrap_or(self.default);
        catch_all.allows(required) && self.rules().all(|access| access.allows(required))
    }

    /// Some service is granted `required` if any rule, or the default, grants it.
    fn any_allow(&self, required: Access) -> bool {
        self.default.allows(required) || self.rules().any(|access| access.allows(required))
    }
}

impl Authorizer for PolicyAuthorizer {
    fn intentions(&self, service: &str, _ctx: &AuthorizerContext) -> Access {
        if service != WILDCARD {
            return self.lookup(service);
        }

        if self.all_allow(Access::Write) {
            Access::Write
        } else if self.any_allow(Access::Read) {
            Access::Read
        } else {
            Access::Deny
        }
    }
}

// === impl IntentionSpec ===

impl IntentionSpec {
    /// Indicates whether the caller may view this intention.
    pub fn can_read<A: Authorizer + ?Sized>(&self, authz: &A) -> bool {
        self.can_read_with(authz, &DefaultMeta)
    }

    /// Indicates whether the caller may create, modify or delete this intention.
    pub fn can_write<A: Authorizer + ?Sized>(&self, authz: &A) -> bool {
        self.can_write_with(authz, &DefaultMeta)
    }

    pub fn can_read_with<A, M>(&self, authz: &A, meta: &M) -> bool
    where
        A: Authorizer + ?Sized,
        M: EnterpriseMeta + ?Sized,
    {
        [Endpoint::Source, Endpoint::Destination]
            .into_iter()
            .any(|endpoint| self.access(authz, meta, endpoint).allows(Access::Read))
    }

    pub fn can_write_with<A, M>(&self, authz: &A, meta: &M) -> bool
    where
        A: Authorizer + ?Sized,
        M: EnterpriseMeta + ?Sized,
    {
        [Endpoint::Source, Endpoint::Destination]
            .into_iter()
            .all(|endpoint| self.access(authz, meta, endpoint).allows(Access::Write))
    }

    fn access<A, M>(&self, authz: &A, meta: &M, endpoint: Endpoint) -> Access
    where
        A: Authorizer + ?Sized,
        M: EnterpriseMeta + ?Sized,
    {
        let service = match endpoint {
            Endpoint::Source => &self.source_name,
            Endpoint::Destination => &self.destination_name,
        };
        if service.is_empty() {
            return Access::Deny;
        }

        let mut ctx = AuthorizerContext::default();
        meta.fill_authorizer_context(self, endpoint, &mut ctx);
        authz.intentions(service, &ctx)
    }
}

// === impl Intention ===

impl Intention {
    pub fn can_read<A: Authorizer + ?Sized>(&self, authz: &A) -> bool {
        self.spec().can_read(authz)
    }

    pub fn can_write<A: Authorizer + ?Sized>(&self, authz: &A) -> bool {
        self.spec().can_write(authz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;

    fn web_to_api() -> IntentionSpec {
        IntentionSpec::new(("default", "web"), ("default", "api"), Action::Allow)
    }

    fn wildcard() -> IntentionSpec {
        IntentionSpec::new(("default", "*"), ("default", "*"), Action::Allow)
    }

    #[test]
    fn intention_acls() {
        let cases: &[(&str, IntentionSpec, PolicyAuthorizer, bool, bool)] = &[
            (
                "all-denied",
                web_to_api(),
                PolicyAuthorizer::new(Access::Deny),
                false,
                false,
            ),
            (
                "read-dest",
                web_to_api(),
                PolicyAuthorizer::default().with_service("api", Access::Read),
                true,
                false,
            ),
            (
                "read-source",
                web_to_api(),
                PolicyAuthorizer::default().with_service("web", Access::Read),
                true,
                false,
            ),
            (
                "write-dest-only",
                web_to_api(),
                PolicyAuthorizer::default().with_service("api", Access::Write),
                true,
                false,
            ),
            (
                "write-source-only",
                web_to_api(),
                PolicyAuthorizer::default().with_service("web", Access::Write),
                true,
                false,
            ),
            (
                "write-dest-read-source",
                web_to_api(),
                PolicyAuthorizer::default()
                    .with_service("api", Access::Write)
                    .with_service("web", Access::Read),
                true,
                false,
            ),
            (
                "write-both",
                web_to_api(),
                PolicyAuthorizer::default()
                    .with_service("api", Access::Write)
                    .with_service("web", Access::Write),
                true,
                true,
            ),
            (
                "write-by-prefix",
                web_to_api(),
                PolicyAuthorizer::default()
                    .with_prefix("", Access::Read)
                    .with_prefix("a", Access::Write)
                    .with_prefix("w", Access::Write),
                true,
                true,
            ),
            (
                "exact-overrides-prefix",
                web_to_api(),
                PolicyAuthorizer::default()
                    .with_prefix("", Access::Write)
                    .with_service("web", Access::Deny),
                true,
                false,
            ),
            (
                "deny-wildcard-write-allow-read",
                wildcard(),
                PolicyAuthorizer::default().with_service("*", Access::Write),
                // Write access to any intention allows reading this one.
                true,
                false,
            ),
            (
                "allow-wildcard-write",
                wildcard(),
                PolicyAuthorizer::default().with_prefix("", Access::Write),
                true,
                true,
            ),
            (
                "allow-wildcard-read",
                wildcard(),
                PolicyAuthorizer::default().with_service("foo", Access::Read),
                true,
                false,
            ),
            (
                "deny-wildcard-write-narrowed",
                wildcard(),
                PolicyAuthorizer::default()
                    .with_prefix("", Access::Write)
                    .with_service("db", Access::Read),
                true,
                false,
            ),
            (
                "default-write",
                wildcard(),
                PolicyAuthorizer::new(Access::Write),
                true,
                true,
            ),
        ];

        for (name, spec, authz, read, write) in cases {
            assert_eq!(spec.can_read(authz), *read, "{name}: read");
            assert_eq!(spec.can_write(authz), *write, "{name}: write");
        }
    }

    #[test]
    fn allow_all() {
        assert!(web_to_api().can_read(&AllowAll));
        assert!(web_to_api().can_write(&AllowAll));
        assert!(wildcard().can_write(&AllowAll));
    }

    #[test]
    fn empty_names_are_denied() {
        let mut spec = web_to_api();
        spec.source_name = String::new();
        assert!(spec.can_read(&AllowAll));
        assert!(!spec.can_write(&AllowAll));

        spec.destination_name = String::new();
        assert!(!spec.can_read(&AllowAll));
    }

    #[test]
    fn dyn_authorizer() {
        let authz: Box<dyn Authorizer> =
            Box::new(PolicyAuthorizer::default().with_prefix("", Access::Write));
        let ixn = Intention::new("id".into(), web_to_api());
        assert!(ixn.can_read(authz.as_ref()));
        assert!(ixn.can_write(authz.as_ref()));
    }

    #[test]
    fn parses_access() {
        assert_eq!("write".parse::<Access>().unwrap(), Access::Write);
        assert!("list".parse::<Access>().is_err());
        assert!(Access::Write.allows(Access::Read));
        assert!(!Access::Read.allows(Access::Write));
    }

    #[test]
    fn deserializes_rules() {
        let authz: PolicyAuthorizer = serde_json::from_str(
            r#"{"services": {"api": "write"}, "service_prefixes": {"": "read"}}"#,
        )
        .unwrap();
        assert_eq!(authz.default, Access::Deny);
        assert_eq!(authz.intentions("api", &Default::default()), Access::Write);
        assert_eq!(authz.intentions("web", &Default::default()), Access::Read);
        assert_eq!(authz.intentions("*", &Default::default()), Access::Read);
    }
}
