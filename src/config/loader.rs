//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::LabConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Service name override.
pub const ENV_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
/// Deployment environment override.
pub const ENV_DEPLOY_ENV: &str = "DEPLOY_ENV";
/// OTLP collector endpoint override.
pub const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// Listener bind address override.
pub const ENV_BIND_ADDRESS: &str = "LAB_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_config(path: &Path) -> Result<LabConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the process configuration: file (or defaults), then environment
/// overrides, then validation.
pub fn resolve_config(path: Option<&Path>) -> Result<LabConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => LabConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment-style overrides using `lookup` to read variables.
///
/// Empty values are ignored so that `FOO=` does not blank out a setting.
pub fn apply_overrides<F>(config: &mut LabConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(name) = get(ENV_SERVICE_NAME) {
        config.service.name = name;
    }
    if let Some(env) = get(ENV_DEPLOY_ENV) {
        config.service.environment = env;
    }
    if let Some(endpoint) = get(ENV_OTLP_ENDPOINT) {
        config.telemetry.otlp_endpoint = endpoint;
    }
    if let Some(addr) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
}
