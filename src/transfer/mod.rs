//! Batched token transfer subsystem.
//!
//! # Data Flow
//! ```text
//! Vec<RecipientInstruction> + TransferConfig
//!     → runner.rs (validate config, check session, assign run id)
//!     → planner.rs (ordered windows of batch_size)
//!     → for each batch:
//!         action.rs     (one transfer action per recipient)
//!         submitter.rs  (one authorize-and-broadcast call, outcome recorded)
//!         pacing.rs     (1s pause unless it was the last batch)
//!     → aggregator.rs (per-recipient counts, last successful tx id)
//!     → TransferResult
//! ```
//!
//! # Design Decisions
//! - A failing batch never aborts the run; its recipients are counted as failed
//! - Batches are strictly sequential so nonces and ordering stay predictable
//! - Nothing is retried; callers inspect `TransferResult::unsent_recipients`

pub mod account;
pub mod action;
pub mod aggregator;
pub mod amount;
pub mod error;
pub mod pacing;
pub mod planner;
pub mod runner;
pub mod submitter;
pub mod types;

pub use account::{AccountName, NameError, Symbol};
pub use action::{build_batch_actions, build_transfer_action, format_quantity, Action, PermissionLevel, TransferData};
pub use aggregator::ResultAggregator;
pub use amount::{Amount, AmountError};
pub use error::TransferError;
pub use planner::{plan_batches, Batch};
pub use runner::{send_token_transfer, Disperser};
pub use submitter::submit_batch;
pub use types::{
    check_memos, BatchOutcome, BatchStatus, RecipientInstruction, RunStatus, TransferConfig, TransferResult,
    MAX_MEMO_BYTES,
};
