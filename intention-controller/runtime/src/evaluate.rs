use crate::Service;
use intention_controller_core::{Authorizer, EnterpriseMeta, Intention, IntentionSpec};
use intention_controller_index::{Applied, Index, MatchType, Op};
use std::sync::Arc;
use tracing::{debug, warn};

/// Selects the intentions reported after loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// Every intention the caller can read.
    All,

    /// Intentions that apply to connections from the service.
    Source(Service),

    /// Intentions that apply to connections to the service.
    Destination(Service),
}

/// Creates each intention in the index, in order, and returns the number that were rejected.
pub(crate) fn load<A, M>(
    index: &mut Index,
    specs: Vec<IntentionSpec>,
    authz: &A,
    meta: &M,
) -> usize
where
    A: Authorizer + ?Sized,
    M: EnterpriseMeta + ?Sized,
{
    let mut rejected = 0;
    for (i, mut spec) in specs.into_iter().enumerate() {
        meta.default_namespaces(&mut spec);
        let source = spec.source().to_string();
        let destination = spec.destination().to_string();
        match index.apply(Op::Create(spec), authz) {
            Ok(Applied::Created(id)) => debug!(%id, index = i, "Loaded"),
            Ok(applied) => debug!(id = %applied.id(), index = i, "Ignored"),
            Err(error) => {
                warn!(%error, index = i, %source, %destination, "Intention rejected");
                rejected += 1;
            }
        }
    }
    rejected
}

/// Runs the query against the index, returning readable intentions in precedence order.
pub(crate) fn query<A>(index: &Index, query: &Query, authz: &A) -> Vec<Arc<Intention>>
where
    A: Authorizer + ?Sized,
{
    let intentions = match query {
        Query::All => return index.list_readable(authz),
        Query::Source(svc) => index.matches(MatchType::Source, &svc.namespace, &svc.name),
        Query::Destination(svc) => {
            index.matches(MatchType::Destination, &svc.namespace, &svc.name)
        }
    };
    intentions
        .into_iter()
        .filter(|ixn| ixn.can_read(authz))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use intention_controller_core::{Access, Action, AllowAll, DefaultMeta, PolicyAuthorizer};
    use maplit::btreemap;

    fn specs() -> Vec<IntentionSpec> {
        serde_json::from_str(
            r#"[
                {"SourceName": "web", "DestinationName": "db", "Action": "allow", "SourceType": "consul"},
                {"SourceNS": "*", "SourceName": "*", "DestinationName": "db", "Action": "deny", "SourceType": "consul"},
                {"SourceName": "api", "DestinationName": "cache", "Action": "allow", "SourceType": "consul",
                 "Meta": {"owner": "team-a"}},
                {"SourceName": "web", "DestinationName": "db", "Action": "deny", "SourceType": "consul"},
                {"SourceName": "web*", "DestinationName": "db", "Action": "allow", "SourceType": "consul"}
            ]"#,
        )
        .expect("intentions must parse")
    }

    fn keys(intentions: &[Arc<Intention>]) -> Vec<String> {
        intentions
            .iter()
            .map(|ixn| {
                format!(
                    "{} -> {} ({})",
                    ixn.spec().source(),
                    ixn.spec().destination(),
                    ixn.spec().action
                )
            })
            .collect()
    }

    #[test]
    fn loads_and_lists() {
        let mut index = Index::default();
        // The duplicate and the partial wildcard are rejected.
        assert_eq!(load(&mut index, specs(), &AllowAll, &DefaultMeta), 2);
        assert_eq!(index.len(), 3);

        let cache = index
            .list()
            .into_iter()
            .find(|ixn| ixn.spec().destination_name == "cache")
            .expect("cache intention must be loaded");
        assert_eq!(
            cache.spec().meta,
            btreemap! { "owner".to_string() => "team-a".to_string() }
        );

        assert_eq!(
            keys(&query(&index, &Query::All, &AllowAll)),
            vec![
                "default/api -> default/cache (allow)",
                "default/web -> default/db (allow)",
                "*/* -> default/db (deny)",
            ]
        );
    }

    #[test]
    fn queries_by_service() {
        let mut index = Index::default();
        load(&mut index, specs(), &AllowAll, &DefaultMeta);

        let db = Service {
            namespace: "default".to_string(),
            name: "db".to_string(),
        };
        assert_eq!(
            keys(&query(&index, &Query::Destination(db.clone()), &AllowAll)),
            vec![
                "default/web -> default/db (allow)",
                "*/* -> default/db (deny)",
            ]
        );
        assert_eq!(
            keys(&query(&index, &Query::Source(db.clone()), &AllowAll)),
            vec!["*/* -> default/db (deny)"]
        );

        // A read rule for any service grants read on the wildcard source.
        let authz = PolicyAuthorizer::default().with_service("api", Access::Read);
        let api = Service {
            namespace: "default".to_string(),
            name: "api".to_string(),
        };
        assert_eq!(
            keys(&query(&index, &Query::Source(api), &authz)),
            vec![
                "default/api -> default/cache (allow)",
                "*/* -> default/db (deny)",
            ]
        );
        assert_eq!(
            keys(&query(&index, &Query::Destination(db), &authz)),
            vec!["*/* -> default/db (deny)"]
        );
    }

    #[test]
    fn rejects_unauthorized_writes() {
        let mut index = Index::default();
        let authz = PolicyAuthorizer::default()
            .with_service("web", Access::Write)
            .with_service("db", Access::Write);
        let specs = vec![
            IntentionSpec::new(("", "web"), ("", "db"), Action::Allow),
            IntentionSpec::new(("", "api"), ("", "db"), Action::Allow),
        ];
        assert_eq!(load(&mut index, specs, &authz, &DefaultMeta), 1);
        assert_eq!(
            keys(&index.list()),
            vec!["default/web -> default/db (allow)"]
        );
    }
}
