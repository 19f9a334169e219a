//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::time::Instant;

use token_disperse::lifecycle::Shutdown;
use token_disperse::session::{BroadcastReceipt, FailureKind, SessionFailure, SigningSession};
use token_disperse::transfer::{AccountName, Action, RecipientInstruction, Symbol, TransferConfig};

/// One authorize-and-broadcast call seen by a [`ScriptedSession`].
#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub actions: Vec<Action>,
}

/// In-process signing session that answers from a script.
///
/// Calls beyond the script succeed with id `tx<n>`.
pub struct ScriptedSession {
    actor: AccountName,
    authenticated: bool,
    script: Mutex<VecDeque<Result<BroadcastReceipt, SessionFailure>>>,
    calls: Mutex<Vec<Call>>,
    trigger: Option<(usize, Arc<Shutdown>)>,
}

impl ScriptedSession {
    pub fn new(actor: &str) -> Self {
        Self {
            actor: AccountName::new(actor).unwrap(),
            authenticated: true,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            trigger: None,
        }
    }

    pub fn answering(actor: &str, script: Vec<Result<BroadcastReceipt, SessionFailure>>) -> Self {
        let session = Self::new(actor);
        *session.script.lock().unwrap() = script.into();
        session
    }

    pub fn logged_out(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Trigger `shutdown` while handling the `call`-th submission (1-based).
    pub fn trigger_shutdown_on(mut self, call: usize, shutdown: Arc<Shutdown>) -> Self {
        self.trigger = Some((call, shutdown));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl SigningSession for ScriptedSession {
    fn actor(&self) -> &AccountName {
        &self.actor
    }

    fn permission(&self) -> &str {
        "active"
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn authorize_and_broadcast(&self, actions: &[Action]) -> Result<BroadcastReceipt, SessionFailure> {
        let number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                at: Instant::now(),
                actions: actions.to_vec(),
            });
            calls.len()
        };

        if let Some((at, shutdown)) = &self.trigger {
            if *at == number {
                shutdown.trigger();
            }
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BroadcastReceipt::with_id(format!("tx{number}"))))
    }
}

pub fn ok(id: &str) -> Result<BroadcastReceipt, SessionFailure> {
    Ok(BroadcastReceipt::with_id(id))
}

pub fn fail(message: &str) -> Result<BroadcastReceipt, SessionFailure> {
    Err(SessionFailure::new(FailureKind::Ledger, message))
}

pub fn wax_config(batch_size: usize) -> TransferConfig {
    TransferConfig {
        sender_name: AccountName::new("treasury").unwrap(),
        contract_name: AccountName::new("eosio.token").unwrap(),
        token_name: Symbol::new("WAX").unwrap(),
        token_precision: 8,
        default_memo: "airdrop".to_string(),
        batch_size,
    }
}

pub fn recipient(name: &str, amount: &str) -> RecipientInstruction {
    RecipientInstruction::new(AccountName::new(name).unwrap(), amount.parse().unwrap())
}

/// `n` recipients with valid, distinct account names.
pub fn recipients(n: usize) -> Vec<RecipientInstruction> {
    (0..n)
        .map(|i| {
            let name = format!("user{}{}", i / 5 % 5 + 1, i % 5 + 1);
            recipient(&name, &format!("{}", i + 1))
        })
        .collect()
}

/// Serve `router` on an ephemeral local port.
pub async fn start_signer(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Start a mock signer logged in as `actor` whose transact endpoint is `f`.
///
/// `f` receives the posted JSON and returns a status code and raw body.
pub async fn start_programmable_signer<F, Fut>(actor: &'static str, f: F) -> SocketAddr
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let f = Arc::new(f);
    let router = Router::new()
        .route(
            "/v1/session",
            get(move || async move {
                Json(json!({ "actor": actor, "permission": "active", "authenticated": true }))
            }),
        )
        .route(
            "/v1/transact",
            post(move |Json(body): Json<Value>| {
                let f = f.clone();
                async move {
                    let (status, body) = f(body).await;
                    (StatusCode::from_u16(status).unwrap(), body)
                }
            }),
        );
    start_signer(router).await
}

/// Start a mock balance indexer answering `/api/balances/wax/{account}` with
/// `balances` for every account. Returns the URL to configure.
pub async fn start_indexer(balances: Value) -> String {
    let router = Router::new().route(
        "/api/balances/wax/{account}",
        get(move |Path(account): Path<String>| {
            let balances = balances.clone();
            async move { Json(json!({ "account_name": account, "balances": balances })) }
        }),
    );
    let addr = start_signer(router).await;
    format!("http://{addr}/api/balances/wax")
}
