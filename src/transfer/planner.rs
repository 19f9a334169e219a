//! Batch planning.

use crate::transfer::error::TransferError;
use crate::transfer::types::RecipientInstruction;

/// A contiguous window of recipients submitted as one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    /// 1-based position of this batch.
    pub number: usize,
    /// Number of batches in the plan.
    pub total: usize,
    pub recipients: &'a [RecipientInstruction],
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.number == self.total
    }
}

/// Split recipients into in-order windows of at most `batch_size`.
///
/// Every recipient lands in exactly one batch; only the last batch may be
/// shorter. Nothing is reordered or deduplicated.
pub fn plan_batches(
    recipients: &[RecipientInstruction],
    batch_size: usize,
) -> Result<Vec<Batch<'_>>, TransferError> {
    if batch_size < 1 {
        return Err(TransferError::InvalidConfiguration(
            "batch size must be at least 1".to_string(),
        ));
    }
    if recipients.is_empty() {
        return Err(TransferError::InvalidConfiguration(
            "no recipients to process".to_string(),
        ));
    }

    let total = recipients.len().div_ceil(batch_size);
    Ok(recipients
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            number: i + 1,
            total,
            recipients: chunk,
        })
        .collect())
}
