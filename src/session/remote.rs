//! Signing session backed by an external signer over HTTP.
//!
//! # Protocol
//! - `GET  {url}/v1/session`  → `{ "actor", "permission", "authenticated" }`
//! - `POST {url}/v1/transact` with `{ "actions": [...] }` → transaction response
//!
//! The signer (a wallet bridge) owns the keys and talks to the ledger; this
//! client only hands it actions and interprets the answer.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::config::SignerConfig;
use crate::session::classify::{classify_response, classify_transport, extract_transaction_id};
use crate::session::types::{BroadcastReceipt, SessionError, SessionFailure};
use crate::session::SigningSession;
use crate::transfer::account::AccountName;
use crate::transfer::action::Action;

/// What the signer reports about its logged-in account.
#[derive(Debug, Clone, Deserialize)]
struct SessionInfo {
    actor: String,
    permission: String,
    #[serde(default = "default_authenticated")]
    authenticated: bool,
}

fn default_authenticated() -> bool {
    true
}

#[derive(Serialize)]
struct TransactRequest<'a> {
    actions: &'a [Action],
}

/// A logged-in session on a remote signer.
#[derive(Clone)]
pub struct RemoteSession {
    client: reqwest::Client,
    session_url: Url,
    transact_url: Url,
    actor: AccountName,
    permission: String,
}

impl RemoteSession {
    /// Probe the signer and bind to its logged-in account.
    ///
    /// Fails when the signer is unreachable, nobody is logged in, or the
    /// logged-in account differs from `config.account`.
    pub async fn connect(config: &SignerConfig) -> Result<Self, SessionError> {
        let base = base_url(&config.url)?;
        let session_url = base
            .join("v1/session")
            .map_err(|e| SessionError::Config(format!("Invalid signer URL '{}': {}", config.url, e)))?;
        let transact_url = base
            .join("v1/transact")
            .map_err(|e| SessionError::Config(format!("Invalid signer URL '{}': {}", config.url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SessionError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let info = fetch_session(&client, &session_url).await?;
        let actor = AccountName::new(info.actor).map_err(|e| SessionError::Unavailable(e.to_string()))?;

        if let Some(expected) = &config.account {
            if expected != actor.as_str() {
                return Err(SessionError::Config(format!(
                    "Signer is logged in as {}, expected {}",
                    actor, expected
                )));
            }
        }

        let permission = config.permission.clone().unwrap_or(info.permission);

        tracing::info!(
            signer = %base,
            actor = %actor,
            permission = %permission,
            "Connected to signing session"
        );

        Ok(Self {
            client,
            session_url,
            transact_url,
            actor,
            permission,
        })
    }
}

/// Ask the signer who is logged in. A 401 or `authenticated: false` means
/// nobody is.
async fn fetch_session(client: &reqwest::Client, session_url: &Url) -> Result<SessionInfo, SessionError> {
    let response = client
        .get(session_url.clone())
        .send()
        .await
        .map_err(|e| SessionError::Unavailable(e.to_string()))?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(SessionError::NotAuthenticated);
    }
    if !status.is_success() {
        return Err(SessionError::Unavailable(format!(
            "{} returned HTTP {}",
            session_url,
            status.as_u16()
        )));
    }

    let info: SessionInfo = response
        .json()
        .await
        .map_err(|e| SessionError::Unavailable(format!("Malformed session response: {}", e)))?;

    if !info.authenticated {
        return Err(SessionError::NotAuthenticated);
    }
    Ok(info)
}

/// Parse the signer URL so that `join` appends rather than replaces.
fn base_url(raw: &str) -> Result<Url, SessionError> {
    let mut url = Url::parse(raw).map_err(|e| SessionError::Config(format!("Invalid signer URL '{}': {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl SigningSession for RemoteSession {
    fn actor(&self) -> &AccountName {
        &self.actor
    }

    fn permission(&self) -> &str {
        &self.permission
    }

    async fn check_session(&self) -> Result<(), SessionError> {
        let info = fetch_session(&self.client, &self.session_url).await?;
        if info.actor != self.actor.as_str() {
            return Err(SessionError::Config(format!(
                "Signer is now logged in as {}, not {}",
                info.actor, self.actor
            )));
        }
        tracing::debug!(actor = %self.actor, "Signing session still active");
        Ok(())
    }

    async fn authorize_and_broadcast(&self, actions: &[Action]) -> Result<BroadcastReceipt, SessionFailure> {
        tracing::debug!(actions = actions.len(), url = %self.transact_url, "Submitting transaction to signer");

        let response = self
            .client
            .post(self.transact_url.clone())
            .json(&TransactRequest { actions })
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify_transport(&e))?;

        if !status.is_success() {
            return Err(classify_response(status, &body));
        }

        let transaction_id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| extract_transaction_id(&value));

        Ok(BroadcastReceipt { transaction_id })
    }
}

impl std::fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("transact_url", &self.transact_url.as_str())
            .field("actor", &self.actor)
            .field("permission", &self.permission)
            .finish()
    }
}
