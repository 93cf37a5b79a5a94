//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ApiConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ApiConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ApiConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the effective configuration: optional file, then the process
/// environment, validated once at the end.
///
/// `.env` must already be loaded into the environment (see
/// [`crate::observability::logging::init`]).
pub fn load_effective(path: Option<&Path>) -> Result<ApiConfig, ConfigError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => ApiConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment values onto `config`.
///
/// `lookup` abstracts `std::env::var` so the overlay can be tested without
/// touching process state.
pub fn apply_env_overrides<F>(mut config: ApiConfig, lookup: F) -> ApiConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup("PORT") {
        match raw.trim().parse::<u16>() {
            Ok(port) if port != 0 => config.listener.port = port,
            _ => tracing::warn!(
                value = %raw,
                port = config.listener.port,
                "PORT is not a valid port number, keeping configured port"
            ),
        }
    }

    if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
        config.database.url = Some(url);
    }

    if let Some(origins) = lookup("CORS_ALLOWED_ORIGINS") {
        let parsed: std::collections::BTreeSet<String> = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
        if !parsed.is_empty() {
            config.cors.allowed_origins = parsed;
        }
    }

    config
}
