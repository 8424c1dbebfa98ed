use std::env;
use std::fmt;
use std::path::PathBuf;

/// Runtime settings read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub telemetry: TelemetryConfig,
    /// Policy document used when a command gets no `--policy`
    pub default_policy: Option<PathBuf>,
}

impl CliConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("COMMISSION_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
        if log_level.trim().is_empty() {
            return Err(ConfigError::EmptyLogLevel);
        }

        // Read as an OsString so non-UTF-8 paths are kept rather than dropped
        let default_policy = match env::var_os("COMMISSION_POLICY") {
            Some(raw) if !raw.to_string_lossy().trim().is_empty() => {
                let path = match raw.to_str() {
                    Some(text) => PathBuf::from(text.trim()),
                    None => PathBuf::from(raw),
                };
                if !path.is_file() {
                    return Err(ConfigError::PolicyNotFound { path });
                }
                Some(path)
            }
            _ => None,
        };

        Ok(Self {
            telemetry: TelemetryConfig { log_level },
            default_policy,
        })
    }
}

/// Log filter applied when `RUST_LOG` is unset.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyLogLevel,
    PolicyNotFound { path: PathBuf },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyLogLevel => write!(f, "COMMISSION_LOG_LEVEL must not be empty"),
            ConfigError::PolicyNotFound { path } => write!(
                f,
                "COMMISSION_POLICY points to '{}', which is not a file",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
