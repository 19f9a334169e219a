//! Transfer data model: instructions, configuration, outcomes and results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::SessionFailure;
use crate::transfer::account::{AccountName, Symbol};
use crate::transfer::amount::Amount;
use crate::transfer::error::TransferError;

/// Highest token precision the ledger supports.
pub const MAX_TOKEN_PRECISION: u8 = 18;

/// Largest memo the token contract accepts, in bytes.
pub const MAX_MEMO_BYTES: usize = 256;

/// One transfer to perform: who receives, how much, and an optional memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientInstruction {
    pub receiver_name: AccountName,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl RecipientInstruction {
    pub fn new(receiver_name: AccountName, amount: Amount) -> Self {
        Self {
            receiver_name,
            amount,
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// The memo to put on the wire; an empty memo falls back to `default_memo`.
    pub fn effective_memo<'a>(&'a self, default_memo: &'a str) -> &'a str {
        match self.memo.as_deref() {
            Some(memo) if !memo.is_empty() => memo,
            _ => default_memo,
        }
    }
}

/// Everything the core needs to know about the token and how to batch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferConfig {
    /// Account the tokens leave from; must be the session's actor.
    pub sender_name: AccountName,
    pub contract_name: AccountName,
    pub token_name: Symbol,
    pub token_precision: u8,
    #[serde(default)]
    pub default_memo: String,
    pub batch_size: usize,
}

impl TransferConfig {
    /// Reject configurations no run could succeed with.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.batch_size < 1 {
            return Err(TransferError::InvalidConfiguration(
                "batch size must be at least 1".to_string(),
            ));
        }
        if self.token_precision > MAX_TOKEN_PRECISION {
            return Err(TransferError::InvalidConfiguration(format!(
                "token precision {} exceeds maximum {}",
                self.token_precision, MAX_TOKEN_PRECISION
            )));
        }
        Ok(())
    }
}

/// How one batch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchStatus {
    Success {
        #[serde(rename = "transactionId")]
        transaction_id: String,
        /// The session did not report an id; this one was made up locally.
        #[serde(rename = "synthesizedId", default, skip_serializing_if = "is_false")]
        synthesized_id: bool,
    },
    Failed {
        error: SessionFailure,
    },
    /// Never submitted because the run was cancelled first.
    Skipped,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl BatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BatchStatus::Success { .. } => "success",
            BatchStatus::Failed { .. } => "failed",
            BatchStatus::Skipped => "skipped",
        }
    }
}

/// The record of one batch, kept for audit and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub batch_number: usize,
    #[serde(flatten)]
    pub status: BatchStatus,
    pub recipients: Vec<RecipientInstruction>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, BatchStatus::Success { .. })
    }

    pub fn transaction_id(&self) -> Option<&str> {
        match &self.status {
            BatchStatus::Success { transaction_id, .. } => Some(transaction_id),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SessionFailure> {
        match &self.status {
            BatchStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every recipient was covered by a successful batch.
    Success,
    /// Some batches went through, others failed or were skipped.
    PartialSuccess,
    /// No batch succeeded.
    AllFailed,
    /// Cancelled before any batch was attempted.
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Success => "success",
            RunStatus::PartialSuccess => "partial_success",
            RunStatus::AllFailed => "all_failed",
            RunStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Aggregate of a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    /// Recipients covered by successful batches.
    pub success: usize,
    /// Recipients covered by failed batches.
    pub failed: usize,
    /// Recipients in batches skipped after cancellation.
    #[serde(default)]
    pub skipped: usize,
    /// Id of the most recent successful batch.
    pub last_tx_id: Option<String>,
    pub cancelled: bool,
    pub batches: Vec<BatchOutcome>,
}

impl TransferResult {
    pub fn status(&self) -> RunStatus {
        if self.success == 0 {
            if self.cancelled && self.failed == 0 {
                RunStatus::Cancelled
            } else {
                RunStatus::AllFailed
            }
        } else if self.failed == 0 && self.skipped == 0 {
            RunStatus::Success
        } else {
            RunStatus::PartialSuccess
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.failed + self.skipped
    }

    /// The last successful transaction id, or `Unknown`.
    pub fn last_tx_id_or_unknown(&self) -> &str {
        self.last_tx_id.as_deref().unwrap_or("Unknown")
    }

    /// Recipients that did not receive their transfer.
    pub fn unsent_recipients(&self) -> impl Iterator<Item = &RecipientInstruction> {
        self.batches
            .iter()
            .filter(|b| !b.is_success())
            .flat_map(|b| b.recipients.iter())
    }
}
