//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate names against ledger rules before any run starts
//! - Validate value ranges (batch size, precision, timeouts, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DisperseConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;
use url::Url;

use crate::config::schema::DisperseConfig;
use crate::transfer::account::{is_valid_account_name, Symbol};
use crate::transfer::types::{MAX_MEMO_BYTES, MAX_TOKEN_PRECISION};

/// Largest batch accepted from a config file.
pub const MAX_BATCH_SIZE: usize = 50;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "transfer.batch_size").
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check `config` for semantic errors.
pub fn validate_config(config: &DisperseConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let transfer = &config.transfer;

    if let Some(sender) = &transfer.sender {
        if !is_valid_account_name(sender) {
            errors.push(ValidationError::new("transfer.sender", format!("'{}' is not a valid account name", sender)));
        }
    }
    if !is_valid_account_name(&transfer.contract) {
        errors.push(ValidationError::new(
            "transfer.contract",
            format!("'{}' is not a valid account name", transfer.contract),
        ));
    }
    if let Err(e) = Symbol::new(transfer.token.as_str()) {
        errors.push(ValidationError::new("transfer.token", e.to_string()));
    }
    if transfer.precision > MAX_TOKEN_PRECISION {
        errors.push(ValidationError::new(
            "transfer.precision",
            format!("must be at most {}", MAX_TOKEN_PRECISION),
        ));
    }
    if transfer.batch_size < 1 || transfer.batch_size > MAX_BATCH_SIZE {
        errors.push(ValidationError::new(
            "transfer.batch_size",
            format!("must be between 1 and {}", MAX_BATCH_SIZE),
        ));
    }
    if transfer.memo.len() > MAX_MEMO_BYTES {
        errors.push(ValidationError::new(
            "transfer.memo",
            format!("must be at most {} bytes", MAX_MEMO_BYTES),
        ));
    }

    if let Some(balance_url) = transfer.balance_url() {
        match Url::parse(balance_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "transfer.balance_url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("transfer.balance_url", e.to_string())),
        }
    }

    match Url::parse(&config.signer.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "signer.url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("signer.url", e.to_string())),
    }
    if config.signer.timeout_secs == 0 {
        errors.push(ValidationError::new("signer.timeout_secs", "must be greater than 0"));
    }
    if let Some(account) = &config.signer.account {
        if !is_valid_account_name(account) {
            errors.push(ValidationError::new("signer.account", format!("'{}' is not a valid account name", account)));
        }
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.max_body_size == 0 {
        errors.push(ValidationError::new("server.max_body_size", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
