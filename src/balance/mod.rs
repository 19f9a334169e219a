//! Sender balance lookups.
//!
//! Before a run is submitted the sender's balance of the configured token is
//! fetched from an indexer and compared with the list total.

pub mod client;

pub use client::{BalanceClient, BalanceError, TokenBalance};
