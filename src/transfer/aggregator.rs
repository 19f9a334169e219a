//! Folding batch outcomes into a run result.

use crate::transfer::types::{BatchOutcome, BatchStatus, TransferResult};

/// Accumulates [`BatchOutcome`]s in submission order.
///
/// Counts are per recipient, not per batch. `last_tx_id` tracks the most
/// recent success, so a failure after a success leaves it untouched.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    success: usize,
    failed: usize,
    skipped: usize,
    last_tx_id: Option<String>,
    cancelled: bool,
    batches: Vec<BatchOutcome>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: BatchOutcome) {
        let count = outcome.recipients.len();
        match &outcome.status {
            BatchStatus::Success { transaction_id, .. } => {
                self.success += count;
                self.last_tx_id = Some(transaction_id.clone());
            }
            BatchStatus::Failed { .. } => self.failed += count,
            BatchStatus::Skipped => self.skipped += count,
        }
        self.batches.push(outcome);
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn finish(self) -> TransferResult {
        TransferResult {
            success: self.success,
            failed: self.failed,
            skipped: self.skipped,
            last_tx_id: self.last_tx_id,
            cancelled: self.cancelled,
            batches: self.batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FailureKind, SessionFailure};
    use crate::transfer::account::AccountName;
    use crate::transfer::types::{RecipientInstruction, RunStatus};

    fn outcome(number: usize, size: usize, status: BatchStatus) -> BatchOutcome {
        let recipients = (0..size)
            .map(|i| {
                RecipientInstruction::new(
                    AccountName::new(format!("user{}", i % 5 + 1)).unwrap(),
                    "1".parse().unwrap(),
                )
            })
            .collect();
        BatchOutcome {
            batch_number: number,
            status,
            recipients,
        }
    }

    fn ok(id: &str) -> BatchStatus {
        BatchStatus::Success {
            transaction_id: id.to_string(),
            synthesized_id: false,
        }
    }

    fn failed() -> BatchStatus {
        BatchStatus::Failed {
            error: SessionFailure::new(FailureKind::Network, "Failed to fetch"),
        }
    }

    #[test]
    fn test_counts_are_per_recipient() {
        let mut agg = ResultAggregator::new();
        agg.record(outcome(1, 3, ok("tx-a")));
        agg.record(outcome(2, 3, failed()));
        agg.record(outcome(3, 1, ok("tx-c")));

        let result = agg.finish();
        assert_eq!(result.success, 4);
        assert_eq!(result.failed, 3);
        assert_eq!(result.total(), 7);
        assert_eq!(result.batches.len(), 3);
        assert_eq!(result.status(), RunStatus::PartialSuccess);
    }

    #[test]
    fn test_last_tx_id_survives_later_failure() {
        let mut agg = ResultAggregator::new();
        agg.record(outcome(1, 2, ok("tx-first")));
        agg.record(outcome(2, 2, ok("tx-second")));
        agg.record(outcome(3, 2, failed()));

        let result = agg.finish();
        assert_eq!(result.last_tx_id.as_deref(), Some("tx-second"));
    }

    #[test]
    fn test_all_failed_has_no_tx_id() {
        let mut agg = ResultAggregator::new();
        agg.record(outcome(1, 2, failed()));
        agg.record(outcome(2, 2, failed()));

        let result = agg.finish();
        assert_eq!(result.success, 0);
        assert_eq!(result.last_tx_id, None);
        assert_eq!(result.last_tx_id_or_unknown(), "Unknown");
        assert_eq!(result.status(), RunStatus::AllFailed);
    }

    #[test]
    fn test_cancelled_run() {
        let mut agg = ResultAggregator::new();
        agg.record(outcome(1, 2, ok("tx-a")));
        agg.record(outcome(2, 2, BatchStatus::Skipped));
        agg.mark_cancelled();

        let result = agg.finish();
        assert!(result.cancelled);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.status(), RunStatus::PartialSuccess);
        assert_eq!(result.unsent_recipients().count(), 2);

        let mut agg = ResultAggregator::new();
        agg.record(outcome(1, 2, BatchStatus::Skipped));
        agg.mark_cancelled();
        assert_eq!(agg.finish().status(), RunStatus::Cancelled);
    }
}
