use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    /// `COMMISSION_LOG_LEVEL` is not a valid filter directive
    BadLogLevel { directive: String, source: ParseError },
    /// A global subscriber is already installed
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::BadLogLevel { directive, source } => write!(
                f,
                "COMMISSION_LOG_LEVEL '{directive}' is not a log filter ({source}); logging disabled"
            ),
            TelemetryError::AlreadyInstalled(err) => {
                write!(f, "could not install the stderr logger: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::BadLogLevel { source, .. } => Some(source),
            TelemetryError::AlreadyInstalled(err) => Some(&**err),
        }
    }
}

/// `RUST_LOG` when set, otherwise the configured level.
fn filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::BadLogLevel {
            directive: config.log_level.clone(),
            source,
        })
    })
}

/// Install the log subscriber on stderr; stdout carries command output only.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(config)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}
