//! Configuration loading from disk and environment.
//!
//! Precedence: defaults, then the TOML file named by `C4PROXY_CONFIG`,
//! then `C4PROXY_TO` and `C4PROXY_TEST_MODE`.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Mode, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Path of an optional TOML configuration file.
pub const ENV_CONFIG: &str = "C4PROXY_CONFIG";

/// Downstream base URL (proxy) or proxy URL to call back (simulator).
pub const ENV_DOWNSTREAM: &str = "C4PROXY_TO";

/// Any non-empty value selects simulator mode.
pub const ENV_TEST_MODE: &str = "C4PROXY_TEST_MODE";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load configuration from the process environment.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Load configuration using `lookup` in place of the process environment.
pub fn load_with<F>(lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(ENV_CONFIG).filter(|p| !p.is_empty()) {
        Some(path) => read_file(Path::new(&path))?,
        None => ProxyConfig::default(),
    };

    if let Some(url) = lookup(ENV_DOWNSTREAM).filter(|v| !v.is_empty()) {
        config.downstream_url = url;
    }
    if lookup(ENV_TEST_MODE).is_some_and(|v| !v.is_empty()) {
        config.mode = Mode::Simulator;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}
