//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::DisperseConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `signer.url`.
pub const SIGNER_URL_ENV: &str = "DISPERSE_SIGNER_URL";

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
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DisperseConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse, apply environment overrides, and validate.
pub fn parse_config(content: &str) -> Result<DisperseConfig, ConfigError> {
    let mut config: DisperseConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Defaults plus environment overrides, for runs without a config file.
pub fn default_config() -> Result<DisperseConfig, ConfigError> {
    parse_config("")
}

fn apply_env_overrides(config: &mut DisperseConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(SIGNER_URL_ENV).filter(|v| !v.is_empty()) {
        tracing::debug!(url = %url, "Signer URL overridden from environment");
        config.signer.url = url;
    }
}
