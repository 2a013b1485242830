use anyhow::{anyhow, bail, Context, Error, Result};
use tracing_subscriber::EnvFilter;

/// How log lines are rendered on stderr.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

// === impl LogFormat ===

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            s => bail!("invalid log format: {:?}", s),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => "plain".fmt(f),
            Self::Json => "json".fmt(f),
        }
    }
}

/// Installs the global subscriber. Logs go to stderr so that stdout only carries results.
pub(crate) fn init(filter: &str, format: LogFormat) -> Result<()> {
    let filter =
        EnvFilter::try_new(filter).with_context(|| format!("invalid log filter: {filter:?}"))?;
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Plain => fmt.try_init(),
        LogFormat::Json => fmt.json().try_init(),
    }
    .map_err(|error| anyhow!("failed to initialize logging: {error}"))
}
