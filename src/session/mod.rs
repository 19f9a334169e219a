//! Signing session subsystem.
//!
//! # Data Flow
//! ```text
//! Signer config (URL, timeout, expected account)
//!     → remote.rs (login check at connect and before each run,
//!                  authorize-and-broadcast over HTTP)
//!     → classify.rs (any failure → SessionFailure { kind, message })
//!     → transfer::submitter (one call per batch)
//! ```
//!
//! # Security Constraints
//! - Private keys never enter this process; the signer holds them
//! - Sessions are used by one run at a time, never concurrently

pub mod classify;
pub mod remote;
pub mod types;

use std::future::Future;

use crate::transfer::account::AccountName;
use crate::transfer::action::{Action, PermissionLevel};

pub use remote::RemoteSession;
pub use types::{BroadcastReceipt, FailureKind, SessionError, SessionFailure};

/// An authenticated capability that signs and broadcasts on behalf of one account.
pub trait SigningSession: Send + Sync {
    /// The account this session signs for.
    fn actor(&self) -> &AccountName;

    /// Permission level used for authorization, usually `active`.
    fn permission(&self) -> &str;

    /// Whether the session is still logged in, as far as this process knows.
    fn is_authenticated(&self) -> bool {
        true
    }

    /// Confirm the login is still live before a run starts.
    ///
    /// Defaults to [`is_authenticated`](Self::is_authenticated); sessions backed
    /// by another process ask it again.
    fn check_session(&self) -> impl Future<Output = Result<(), SessionError>> + Send {
        std::future::ready(if self.is_authenticated() {
            Ok(())
        } else {
            Err(SessionError::NotAuthenticated)
        })
    }

    /// Actor and permission as an authorization entry.
    fn permission_level(&self) -> PermissionLevel {
        PermissionLevel {
            actor: self.actor().clone(),
            permission: self.permission().to_string(),
        }
    }

    /// Authorize all `actions` as one transaction and broadcast it.
    fn authorize_and_broadcast(
        &self,
        actions: &[Action],
    ) -> impl Future<Output = Result<BroadcastReceipt, SessionFailure>> + Send;
}
