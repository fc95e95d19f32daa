//! Subscriber setup for hosts embedding the connector.
//!
//! The connector only emits `tracing` events; nothing is printed unless the
//! host installs a subscriber, either its own or the one below.

use std::str::FromStr;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: connector events at `info`,
/// everything else only when it warns.
pub const DEFAULT_FILTER: &str = "warn,ord_connect=info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, for a developer watching a terminal
    Pretty,
    #[default]
    Compact,
    /// One JSON object per event, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" | "" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl LogFormat {
    /// `ORD_CONNECT_LOG_FORMAT` wins; `ORD_CONNECT_LOG_JSON=1` is honoured
    /// when no format is named.
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::var("ORD_CONNECT_LOG_FORMAT").ok().as_deref(),
            std::env::var("ORD_CONNECT_LOG_JSON").ok().as_deref(),
        )
    }

    fn resolve(format: Option<&str>, json: Option<&str>) -> Self {
        if let Some(Ok(parsed)) = format.map(str::parse::<LogFormat>) {
            return parsed;
        }
        match json {
            Some("1") | Some("true") => Self::Json,
            _ => Self::default(),
        }
    }
}

/// Install a stderr subscriber in the format named by the environment.
/// Does nothing if a global subscriber is already set.
pub fn init_logging() { init_logging_with(LogFormat::from_env()) }

pub fn init_logging_with(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt::Subscriber::builder().with_env_filter(filter).with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };
    if installed.is_ok() {
        tracing::debug!("logging initialised ({:?})", format);
    }
}
