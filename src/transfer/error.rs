//! Run-level transfer errors.

use thiserror::Error;

/// Failures that stop a transfer run before any batch is submitted.
///
/// Per-batch failures never surface here; they are recorded in the
/// batch outcome and counted in the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Missing or malformed transfer configuration, or nothing to send.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Signing session missing, unauthenticated, or bound to another sender.
    #[error("Session error: {0}")]
    Session(String),

    /// The sender holds less of the token than the list sends.
    #[error("Total amount ({total}) exceeds your available balance ({available})")]
    InsufficientBalance { total: String, available: String },

    /// The sender's balance could not be looked up.
    #[error("Balance lookup failed: {0}")]
    Balance(String),
}
