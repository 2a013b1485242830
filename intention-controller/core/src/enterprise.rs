use crate::{AuthorizerContext, IntentionSpec};

/// The namespace assumed when none is specified.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Identifies one end of an intention.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Source,
    Destination,
}

/// Namespace and partition handling that varies between editions.
///
/// The open-source edition has a single namespace, so [`DefaultMeta`] resolves everything to
/// [`DEFAULT_NAMESPACE`] and attaches nothing to authorization checks.
pub trait EnterpriseMeta {
    /// Populates the context used to authorize access to one end of an intention.
    fn fill_authorizer_context(
        &self,
        spec: &IntentionSpec,
        endpoint: Endpoint,
        ctx: &mut AuthorizerContext,
    );

    /// Fills in namespaces that were left empty by the client.
    fn default_namespaces(&self, spec: &mut IntentionSpec);
}

/// The single-namespace implementation of [`EnterpriseMeta`].
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultMeta;

// === impl DefaultMeta ===

impl EnterpriseMeta for DefaultMeta {
    fn fill_authorizer_context(
        &self,
        _spec: &IntentionSpec,
        _endpoint: Endpoint,
        _ctx: &mut AuthorizerContext,
    ) {
    }

    fn default_namespaces(&self, spec: &mut IntentionSpec) {
        if spec.source_ns.is_empty() {
            spec.source_ns = DEFAULT_NAMESPACE.to_string();
        }
        if spec.destination_ns.is_empty() {
            spec.destination_ns = DEFAULT_NAMESPACE.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;

    #[test]
    fn defaults_empty_namespaces() {
        let mut spec = IntentionSpec::new(("", "web"), ("", "db"), Action::Allow);
        DefaultMeta.default_namespaces(&mut spec);
        assert_eq!(spec.source().to_string(), "default/web");
        assert_eq!(spec.destination().to_string(), "default/db");

        let mut spec = IntentionSpec::new(("*", "*"), ("team", "db"), Action::Allow);
        DefaultMeta.default_namespaces(&mut spec);
        assert_eq!(spec.source().to_string(), "*/*");
        assert_eq!(spec.destination().to_string(), "team/db");
    }

    #[test]
    fn attaches_nothing_to_authorizer_context() {
        let spec = IntentionSpec::new(("default", "web"), ("default", "db"), Action::Allow);
        let mut ctx = AuthorizerContext::default();
        DefaultMeta.fill_authorizer_context(&spec, Endpoint::Destination, &mut ctx);
        assert_eq!(ctx, AuthorizerContext::default());
    }
}
