use clap::Args;
use serde_json::Value;
use std::path::{Path, PathBuf};

use commission_core::policy::{standard_policy, CompensationPolicy};

use crate::config::CliConfig;
use crate::input;

/// Resolve the policy for a command: `--policy`, then `COMMISSION_POLICY`,
/// then the built-in standard preset.
pub fn load_policy(
    path: Option<&Path>,
    config: &CliConfig,
) -> Result<CompensationPolicy, Box<dyn std::error::Error>> {
    match path.or(config.default_policy.as_deref()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading policy document");
            let value: Value = input::file::read_document(path)?;
            Ok(CompensationPolicy::from_value(value)?)
        }
        None => {
            tracing::info!("no policy given; using the standard preset");
            Ok(standard_policy())
        }
    }
}

/// Arguments for policy validation
#[derive(Args)]
pub struct ValidatePolicyArgs {
    /// Path to a JSON or YAML policy document
    #[arg(long)]
    pub policy: Option<PathBuf>,
}

pub fn run_validate_policy(
    args: ValidatePolicyArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let value: Value = if let Some(ref path) = args.policy {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else if let Some(ref path) = config.default_policy {
        input::file::read_document(path)?
    } else {
        return Err("--policy <file>, stdin or COMMISSION_POLICY required".into());
    };

    let policy: CompensationPolicy = serde_json::from_value(value)?;
    let warnings = policy.validate()?;

    Ok(serde_json::json!({
        "valid": true,
        "business_lines": policy.rates.len(),
        "global_target": policy.global_target,
        "warnings": warnings,
    }))
}

/// Print the standard preset, ready to be edited into a custom policy.
pub fn run_default_policy() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(standard_policy())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelemetryConfig;
    use std::io::Write;

    fn bare_config() -> CliConfig {
        CliConfig {
            telemetry: TelemetryConfig {
                log_level: "warn".into(),
            },
            default_policy: None,
        }
    }

    #[test]
    fn test_falls_back_to_standard_preset() {
        let policy = load_policy(None, &bare_config()).unwrap();
        assert_eq!(policy, standard_policy());
    }

    #[test]
    fn test_loads_yaml_policy() {
        let yaml = serde_yaml::to_string(&standard_policy()).unwrap();
        let path = std::env::temp_dir().join(format!("comm-policy-{}.yaml", std::process::id()));
        std::fs::File::create(&path)
            .unwrap()
            .write_all(yaml.as_bytes())
            .unwrap();

        let policy = load_policy(Some(&path), &bare_config()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(policy, standard_policy());
    }

    #[test]
    fn test_configured_policy_path_is_used() {
        let mut policy = standard_policy();
        policy.global_target = rust_decimal::Decimal::from(900000);
        let path = std::env::temp_dir().join(format!("comm-configured-{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_vec(&policy).unwrap()).unwrap();

        let config = CliConfig {
            default_policy: Some(path.clone()),
            ..bare_config()
        };
        let loaded = load_policy(None, &config);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.unwrap().global_target, policy.global_target);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_configured_path_is_not_ignored() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = std::env::temp_dir().join(OsStr::from_bytes(b"comm-\xff-policy.json"));
        let config = CliConfig {
            default_policy: Some(path),
            ..bare_config()
        };
        // The file does not exist, so the load must fail rather than fall
        // back to the standard preset
        let err = load_policy(None, &config).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_default_policy_round_trips_through_validation() {
        let value = run_default_policy().unwrap();
        let policy = CompensationPolicy::from_value(value).unwrap();
        assert_eq!(policy.global_target, standard_policy().global_target);
    }
}
