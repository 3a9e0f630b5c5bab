//! Configuration loading: defaults, then an optional TOML file, then the
//! process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{LogFormat, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {var}: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },

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

/// Load and validate configuration.
///
/// With no path, the built-in defaults are the base layer. Environment
/// overrides are applied on top of either and the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML document into a config. Missing sections take defaults.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Recognized: `PORT`, `DATABASE_URL`, `REDIS_URL`, `SERVICE_NAME`,
/// `LOG_FORMAT`. Empty values count as unset.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

    if let Some(value) = get("PORT") {
        config.listener.port = value.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Env {
                var: "PORT",
                value: value.clone(),
                reason: e.to_string(),
            }
        })?;
    }

    if let Some(value) = get("DATABASE_URL") {
        config.database.url = value;
    }

    if let Some(value) = get("REDIS_URL") {
        config.cache.url = value;
    }

    if let Some(value) = get("SERVICE_NAME") {
        config.service.name = value;
    }

    if let Some(value) = get("LOG_FORMAT") {
        config.observability.log_format = match value.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            _ => {
                return Err(ConfigError::Env {
                    var: "LOG_FORMAT",
                    value,
                    reason: "expected `json` or `pretty`".to_string(),
                })
            }
        };
    }

    Ok(())
}
