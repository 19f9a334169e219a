//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML file. Every
//! section has defaults so an empty file is a usable configuration.

use serde::{Deserialize, Serialize};

use crate::transfer::account::{AccountName, Symbol};
use crate::transfer::error::TransferError;
use crate::transfer::types::TransferConfig;

/// Root configuration for the disperse tool.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DisperseConfig {
    /// Token and batching settings.
    pub transfer: TransferSettings,

    /// Remote signer connection.
    pub signer: SignerConfig,

    /// HTTP API listener.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Token and batching settings, kept as plain strings until validated.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Account the tokens are sent from. Required to run; it must be the
    /// account the signer is logged in as.
    pub sender: Option<String>,

    /// Token contract account (e.g., "alien.worlds").
    pub contract: String,

    /// Token symbol (e.g., "TLM").
    pub token: String,

    /// Decimal places the token contract expects.
    pub precision: u8,

    /// Memo for recipients without one.
    pub memo: String,

    /// Transfers per transaction.
    pub batch_size: usize,

    /// Balance indexer endpoint for the chain; the sender's account is
    /// appended. Empty disables the balance check.
    pub balance_url: String,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            sender: None,
            contract: "alien.worlds".to_string(),
            token: "TLM".to_string(),
            precision: 4,
            memo: "Disperse".to_string(),
            batch_size: 15,
            balance_url: DEFAULT_BALANCE_URL.to_string(),
        }
    }
}

/// Public WAX light API balances endpoint.
pub const DEFAULT_BALANCE_URL: &str = "https://lightapi-wax.qaraqol.com/api/balances/wax";

impl TransferSettings {
    /// The balance indexer to check against, if enabled.
    pub fn balance_url(&self) -> Option<&str> {
        Some(self.balance_url.trim()).filter(|url| !url.is_empty())
    }

    /// Convert into the typed configuration the transfer core consumes.
    ///
    /// # Errors
    /// [`TransferError::InvalidConfiguration`] when `sender` is missing or any
    /// name or range is invalid.
    pub fn to_transfer_config(&self) -> Result<TransferConfig, TransferError> {
        let invalid = |e: crate::transfer::account::NameError| TransferError::InvalidConfiguration(e.to_string());

        let sender = match self.sender.as_deref() {
            Some(sender) if !sender.is_empty() => sender,
            _ => {
                return Err(TransferError::InvalidConfiguration(
                    "Missing required configuration parameters: sender".to_string(),
                ))
            }
        };

        let config = TransferConfig {
            sender_name: AccountName::new(sender).map_err(invalid)?,
            contract_name: AccountName::new(self.contract.as_str()).map_err(invalid)?,
            token_name: Symbol::new(self.token.as_str()).map_err(invalid)?,
            token_precision: self.precision,
            default_memo: self.memo.clone(),
            batch_size: self.batch_size,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Remote signer connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Base URL of the signer (overridden by `DISPERSE_SIGNER_URL`).
    pub url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Account the signer must be logged in as.
    pub account: Option<String>,

    /// Permission to authorize with; defaults to what the signer reports.
    pub permission: Option<String>,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:7777".to_string(),
            timeout_secs: 30,
            account: None,
            permission: None,
        }
    }
}

/// HTTP API listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_body_size: 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: DisperseConfig = toml::from_str("").unwrap();
        assert_eq!(config.transfer.contract, "alien.worlds");
        assert_eq!(config.transfer.token, "TLM");
        assert_eq!(config.transfer.precision, 4);
        assert_eq!(config.transfer.memo, "Disperse");
        assert_eq!(config.transfer.batch_size, 15);
        assert_eq!(config.transfer.balance_url(), Some(DEFAULT_BALANCE_URL));
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_sections() {
        let config: DisperseConfig = toml::from_str(
            r#"
            [transfer]
            token = "WAX"
            precision = 8

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.transfer.token, "WAX");
        assert_eq!(config.transfer.contract, "alien.worlds");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.signer.timeout_secs, 30);
    }

    #[test]
    fn test_empty_balance_url_disables_check() {
        let config: DisperseConfig = toml::from_str("[transfer]\nbalance_url = \"\"").unwrap();
        assert_eq!(config.transfer.balance_url(), None);
    }

    #[test]
    fn test_to_transfer_config() {
        let settings = TransferSettings {
            sender: Some("treasury".to_string()),
            ..TransferSettings::default()
        };
        let config = settings.to_transfer_config().unwrap();
        assert_eq!(config.sender_name.as_str(), "treasury");
        assert_eq!(config.token_name.as_str(), "TLM");
        assert_eq!(config.batch_size, 15);

        let bad = TransferSettings {
            token: "tlm".to_string(),
            ..settings.clone()
        };
        assert!(matches!(bad.to_transfer_config(), Err(TransferError::InvalidConfiguration(_))));

        let zero = TransferSettings {
            batch_size: 0,
            ..settings
        };
        assert!(zero.to_transfer_config().is_err());
    }

    #[test]
    fn test_to_transfer_config_requires_sender() {
        for sender in [None, Some(String::new())] {
            let settings = TransferSettings {
                sender,
                ..TransferSettings::default()
            };
            assert_eq!(
                settings.to_transfer_config(),
                Err(TransferError::InvalidConfiguration(
                    "Missing required configuration parameters: sender".to_string()
                ))
            );
        }
    }
}
