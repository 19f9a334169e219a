//! Session-facing types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse category of a failed authorize-and-broadcast call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Signer or RPC endpoint unreachable, or the connection broke.
    Network,
    /// No answer within the configured deadline.
    Timeout,
    /// The wallet or its user refused to sign.
    Rejected,
    /// The ledger rejected the transaction (bad quantity, overdrawn balance, ...).
    Ledger,
    /// Anything that did not fit the categories above.
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Network => "network",
            FailureKind::Timeout => "timeout",
            FailureKind::Rejected => "rejected",
            FailureKind::Ledger => "ledger",
            FailureKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A normalized authorize-and-broadcast failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} error: {message}")]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SessionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// What a successful broadcast reported back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReceipt {
    /// Ledger transaction id, when the response exposed one.
    pub transaction_id: Option<String>,
}

impl BroadcastReceipt {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            transaction_id: Some(id.into()),
        }
    }
}

/// Errors establishing a signing session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Bad signer URL or account settings.
    #[error("Invalid signer configuration: {0}")]
    Config(String),

    /// The signer could not be reached or answered garbage.
    #[error("Signer unavailable: {0}")]
    Unavailable(String),

    /// The signer is reachable but nobody is logged in.
    #[error("Signer has no authenticated account")]
    NotAuthenticated,
}
