//! One transfer run: plan, submit, pace, aggregate.
//!
//! Batches go out strictly one after another. A failed batch is recorded and
//! the run moves on. Only configuration, session and balance problems stop a
//! run, and those are raised before anything is submitted.

use std::cmp::Ordering;
use uuid::Uuid;

use crate::balance::BalanceClient;
use crate::lifecycle::ShutdownSignal;
use crate::observability::{metrics, LogSink, TracingSink};
use crate::recipients::total_amount;
use crate::session::{SessionError, SigningSession};
use crate::transfer::aggregator::ResultAggregator;
use crate::transfer::error::TransferError;
use crate::transfer::pacing::{needs_pause, pause_or_shutdown};
use crate::transfer::planner::{plan_batches, Batch};
use crate::transfer::submitter::submit_batch;
use crate::transfer::types::{
    check_memos, BatchOutcome, BatchStatus, RecipientInstruction, RunStatus, TransferConfig, TransferResult,
};

static TRACING_SINK: TracingSink = TracingSink;

/// Drives a single run against one signing session.
pub struct Disperser<'a, S> {
    session: &'a S,
    config: &'a TransferConfig,
    sink: &'a dyn LogSink,
    shutdown: Option<ShutdownSignal>,
    balances: Option<&'a BalanceClient>,
}

impl<'a, S: SigningSession> Disperser<'a, S> {
    pub fn new(session: &'a S, config: &'a TransferConfig) -> Self {
        Self {
            session,
            config,
            sink: &TRACING_SINK,
            shutdown: None,
            balances: None,
        }
    }

    /// Send progress events to `sink` instead of only to tracing.
    pub fn with_sink(mut self, sink: &'a dyn LogSink) -> Self {
        self.sink = sink;
        self
    }

    /// Stop before the next batch once `signal` fires.
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    /// Refuse the run when the sender's balance, as reported by `client`,
    /// is below the list total.
    pub fn with_balance_check(mut self, client: &'a BalanceClient) -> Self {
        self.balances = Some(client);
        self
    }

    /// Execute the run.
    ///
    /// # Errors
    /// All of these are returned before the first submission:
    /// - [`TransferError::InvalidConfiguration`] for an unusable config, an
    ///   oversize memo or an empty recipient list
    /// - [`TransferError::Session`] when the session is logged out or signs
    ///   for someone other than `sender_name`
    /// - [`TransferError::InsufficientBalance`] and [`TransferError::Balance`]
    ///   from the balance check, when one is configured
    pub async fn run(self, recipients: &[RecipientInstruction]) -> Result<TransferResult, TransferError> {
        let sink = self.sink;
        match self.execute(recipients).await {
            Ok(result) => Ok(result),
            Err(e) => {
                sink.error(format!("Error processing transfers: {e}"));
                metrics::record_run("error");
                Err(e)
            }
        }
    }

    async fn preflight(&self, recipients: &[RecipientInstruction]) -> Result<(), TransferError> {
        self.config.validate()?;
        check_memos(recipients)?;

        self.session.check_session().await.map_err(|e| match e {
            SessionError::NotAuthenticated => TransferError::Session("No active session".to_string()),
            other => TransferError::Session(other.to_string()),
        })?;

        let actor = self.session.actor();
        let sender = &self.config.sender_name;
        if sender != actor {
            return Err(TransferError::Session(format!(
                "session is signed in as {actor}, not {sender}"
            )));
        }
        Ok(())
    }

    async fn check_balance(
        &self,
        client: &BalanceClient,
        recipients: &[RecipientInstruction],
    ) -> Result<(), TransferError> {
        let config = self.config;
        let total = total_amount(recipients)
            .ok_or_else(|| TransferError::InvalidConfiguration("total amount is out of range".to_string()))?;

        let balance = client
            .token_balance(&config.sender_name, &config.contract_name, &config.token_name)
            .await
            .map_err(|e| TransferError::Balance(e.to_string()))?;

        let available = match &balance {
            Some(balance) => {
                if balance.decimals != config.token_precision {
                    self.sink.warning(format!(
                        "Configured precision {} differs from {} contract precision {}",
                        config.token_precision, config.token_name, balance.decimals
                    ));
                }
                balance.available().map_err(|e| TransferError::Balance(e.to_string()))?
            }
            None => None,
        };

        let exceeds = match &available {
            Some(available) => total.compare(available) == Ordering::Greater,
            None => true,
        };
        if exceeds {
            return Err(TransferError::InsufficientBalance {
                total: total.to_string(),
                available: balance.map(|b| b.amount).unwrap_or_else(|| "0".to_string()),
            });
        }

        tracing::debug!(total = %total, available = ?available.map(|a| a.to_string()), "Balance covers the run");
        Ok(())
    }

    async fn execute(mut self, recipients: &[RecipientInstruction]) -> Result<TransferResult, TransferError> {
        self.preflight(recipients).await?;
        let batches = plan_batches(recipients, self.config.batch_size)?;
        if let Some(client) = self.balances {
            self.check_balance(client, recipients).await?;
        }

        let run_id = Uuid::new_v4();
        tracing::info!(
            run_id = %run_id,
            sender = %self.session.actor(),
            recipients = recipients.len(),
            batches = batches.len(),
            batch_size = self.config.batch_size,
            "Transfer run started"
        );
        self.sink.info(format!(
            "Starting to process {} transfers in batches of {}",
            recipients.len(),
            self.config.batch_size
        ));

        let mut aggregator = ResultAggregator::new();
        let mut iter = batches.iter();

        while let Some(batch) = iter.next() {
            if self.shutdown.as_mut().is_some_and(|s| s.is_triggered()) {
                self.skip_rest(&mut aggregator, std::iter::once(batch).chain(iter));
                break;
            }

            let outcome = submit_batch(self.session, batch, self.config, self.sink).await;
            aggregator.record(outcome);

            if needs_pause(batch) && pause_or_shutdown(self.shutdown.as_mut()).await {
                self.skip_rest(&mut aggregator, iter);
                break;
            }
        }

        let result = aggregator.finish();
        self.summarize(&result);

        let status = result.status();
        metrics::record_run(&status.to_string());
        tracing::info!(
            run_id = %run_id,
            status = %status,
            success = result.success,
            failed = result.failed,
            skipped = result.skipped,
            "Transfer run finished"
        );
        Ok(result)
    }

    fn skip_rest<'b, 'r: 'b>(
        &self,
        aggregator: &mut ResultAggregator,
        remaining: impl Iterator<Item = &'b Batch<'r>>,
    ) {
        aggregator.mark_cancelled();
        let mut skipped = 0;
        for batch in remaining {
            skipped += batch.len();
            aggregator.record(BatchOutcome {
                batch_number: batch.number,
                status: BatchStatus::Skipped,
                recipients: batch.recipients.to_vec(),
            });
        }
        metrics::record_skipped(skipped);
        self.sink.warning(format!(
            "Processing cancelled; {skipped} transfers were not submitted"
        ));
    }

    fn summarize(&self, result: &TransferResult) {
        match result.status() {
            RunStatus::Success => self.sink.success(format!(
                "Transaction successful! ID: {}",
                result.last_tx_id_or_unknown()
            )),
            RunStatus::PartialSuccess => {
                self.sink.warning(format!(
                    "Transaction partially successful. ID: {}",
                    result.last_tx_id_or_unknown()
                ));
                self.sink.warning(format!(
                    "{} of {} transfers failed",
                    result.failed + result.skipped,
                    result.total()
                ));
            }
            RunStatus::AllFailed => self.sink.error("All transactions failed".to_string()),
            RunStatus::Cancelled => self
                .sink
                .warning("Processing cancelled before any batch was submitted".to_string()),
        }

        let mut line = format!(
            "Completed processing. {} successful, {} failed.",
            result.success, result.failed
        );
        if result.skipped > 0 {
            line.push_str(&format!(" {} skipped.", result.skipped));
        }
        if result.failed > 0 || result.skipped > 0 {
            self.sink.warning(line);
        } else {
            self.sink.success(line);
        }
    }
}

/// Run one transfer with progress reported to `sink`.
pub async fn send_token_transfer<S: SigningSession>(
    session: &S,
    recipients: &[RecipientInstruction],
    config: &TransferConfig,
    sink: &dyn LogSink,
) -> Result<TransferResult, TransferError> {
    Disperser::new(session, config).with_sink(sink).run(recipients).await
}
