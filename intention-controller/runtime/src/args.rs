use crate::{
    core::{AllowAll, Authorizer, DefaultMeta, Intention, IntentionSpec, PolicyAuthorizer},
    core::{DEFAULT_NAMESPACE, WILDCARD},
    evaluate::{self, Query},
    index::{Index, IndexMetrics},
    log::{self, LogFormat},
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use serde::de::DeserializeOwned;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::info;

#[derive(Debug, Parser)]
#[clap(name = "intention-controller", about = "Evaluates service intentions")]
pub struct Args {
    #[clap(
        long,
        default_value = "intention=info,warn",
        env = "INTENTION_CONTROLLER_LOG"
    )]
    log_level: String,

    #[clap(long, default_value = "plain")]
    log_format: LogFormat,

    /// A JSON array of intentions to load.
    #[clap(long)]
    intentions: PathBuf,

    /// A JSON document of ACL rules.
    ///
    /// When omitted, ACLs are disabled and every intention may be read and written.
    #[clap(long)]
    acl_rules: Option<PathBuf>,

    /// Only reports intentions that apply to connections from this service (`NAMESPACE/NAME`).
    #[clap(long, conflicts_with = "destination")]
    source: Option<Service>,

    /// Only reports intentions that apply to connections to this service (`NAMESPACE/NAME`).
    #[clap(long)]
    destination: Option<Service>,

    /// Fails if any intention is rejected.
    #[clap(long)]
    strict: bool,

    /// Writes index metrics to stderr before exiting.
    #[clap(long)]
    print_metrics: bool,
}

/// A concrete service, parsed from `NAMESPACE/NAME` or a bare `NAME` in the default namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Service {
    pub namespace: String,
    pub name: String,
}

// === impl Args ===

impl Args {
    #[inline]
    pub fn parse_and_run() -> Result<()> {
        Self::parse().run()
    }

    pub fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            intentions,
            acl_rules,
            source,
            destination,
            strict,
            print_metrics,
        } = self;

        log::init(&log_level, log_format)?;

        let authz: Box<dyn Authorizer> = match acl_rules {
            Some(path) => {
                let rules = read_json::<PolicyAuthorizer>(&path)?;
                info!(path = %path.display(), default = %rules.default, "Loaded ACL rules");
                Box::new(rules)
            }
            None => {
                info!("ACLs disabled");
                Box::new(AllowAll)
            }
        };

        let specs = read_json::<Vec<IntentionSpec>>(&intentions)?;
        let total = specs.len();

        let mut prom = Registry::default();
        let mut index = Index::new(IndexMetrics::register(&mut prom));
        let rejected = evaluate::load(&mut index, specs, authz.as_ref(), &DefaultMeta);
        info!(loaded = index.len(), rejected, "Loaded {total} intentions");
        if strict && rejected > 0 {
            bail!("{rejected} of {total} intentions were rejected");
        }

        let query = match (source, destination) {
            (Some(svc), _) => Query::Source(svc),
            (None, Some(svc)) => Query::Destination(svc),
            (None, None) => Query::All,
        };
        let found = evaluate::query(&index, &query, authz.as_ref());
        let found = found.iter().map(|ixn| &**ixn).collect::<Vec<&Intention>>();

        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &found)?;
        writeln!(stdout)?;

        if print_metrics {
            let mut text = String::new();
            prometheus_client::encoding::text::encode(&mut text, &prom)?;
            eprint!("{text}");
        }

        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let buf = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&buf).with_context(|| format!("failed to parse {}", path.display()))
}

// === impl Service ===

impl std::str::FromStr for Service {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (namespace, name) = s.split_once('/').unwrap_or((DEFAULT_NAMESPACE, s));
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid service {:?}: expected NAMESPACE/NAME", s);
        }
        if namespace == WILDCARD || name == WILDCARD {
            bail!("invalid service {:?}: must not be a wildcard", s);
        }

        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
