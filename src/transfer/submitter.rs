//! Submission of one batch as one transaction.
//!
//! # Responsibilities
//! - Build the batch's actions and hand them to the session in one call
//! - Turn the answer into a `BatchOutcome`, success or failure
//! - Keep a failed batch from disturbing the ones after it

use chrono::Utc;
use std::time::Instant;

use crate::observability::metrics;
use crate::observability::LogSink;
use crate::session::SigningSession;
use crate::transfer::action::build_batch_actions;
use crate::transfer::planner::Batch;
use crate::transfer::types::{BatchOutcome, BatchStatus, TransferConfig};

/// Local stand-in for a transaction id the signer did not report.
pub fn synthesize_transaction_id(batch_number: usize) -> String {
    format!("tx-{}-{}", Utc::now().timestamp_millis(), batch_number)
}

/// Submit `batch` through `session` and classify the result.
///
/// Never fails: session errors become a `Failed` outcome.
pub async fn submit_batch<S: SigningSession>(
    session: &S,
    batch: &Batch<'_>,
    config: &TransferConfig,
    sink: &dyn LogSink,
) -> BatchOutcome {
    let sender = session.permission_level();
    let actions = build_batch_actions(batch, config, &sender);

    sink.info(format!(
        "Attempting batch {} of {} ({} transfers)",
        batch.number,
        batch.total,
        batch.len()
    ));

    let started = Instant::now();
    let status = match session.authorize_and_broadcast(&actions).await {
        Ok(receipt) => {
            let (transaction_id, synthesized_id) = match receipt.transaction_id {
                Some(id) => (id, false),
                None => (synthesize_transaction_id(batch.number), true),
            };

            if synthesized_id {
                sink.warning(format!(
                    "Batch {} was broadcast but the signer reported no transaction id; using placeholder {}",
                    batch.number, transaction_id
                ));
            }
            sink.success(format!(
                "Batch {} succeeded: {} transfers, transaction {}",
                batch.number,
                batch.len(),
                transaction_id
            ));
            tracing::debug!(batch = batch.number, tx_id = %transaction_id, synthesized_id, "Batch broadcast");

            BatchStatus::Success {
                transaction_id,
                synthesized_id,
            }
        }
        Err(error) => {
            sink.error(format!("Batch {} failed: {}", batch.number, error.message));
            tracing::debug!(batch = batch.number, kind = %error.kind, "Batch rejected");
            BatchStatus::Failed { error }
        }
    };

    metrics::record_batch(status.label(), batch.len(), started);

    BatchOutcome {
        batch_number: batch.number,
        status,
        recipients: batch.recipients.to_vec(),
    }
}
