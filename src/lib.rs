//! Batched token transfers on an EOSIO-style ledger.
//!
//! A recipient list is split into fixed-size batches; each batch becomes one
//! multi-action transaction signed and broadcast by a [`SigningSession`],
//! with a one second pause between batches. A failing batch is recorded and
//! the run carries on, so the caller always gets a full [`TransferResult`].

// Core
pub mod balance;
pub mod session;
pub mod transfer;

// Input and front ends
pub mod http;
pub mod recipients;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::DisperseConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use session::{RemoteSession, SigningSession};
pub use transfer::{send_token_transfer, Disperser, RecipientInstruction, TransferConfig, TransferError, TransferResult};
