//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to listener
//! - Reconnect the signing session on demand when none is held
//! - Stop accepting on shutdown and let an in-flight run wind down

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::balance::BalanceClient;
use crate::config::ServerConfig;
use crate::http::handlers::{health, process_transfers};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::session::{SessionError, SigningSession};

type Connecting<S> = Pin<Box<dyn Future<Output = Result<S, SessionError>> + Send>>;

/// Opens a new signing session.
pub type Connector<S> = Arc<dyn Fn() -> Connecting<S> + Send + Sync>;

/// Wrap an async connect function as a [`Connector`].
pub fn connector<S, F, Fut>(connect: F) -> Connector<S>
where
    S: 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<S, SessionError>> + Send + 'static,
{
    Arc::new(move || -> Connecting<S> { Box::pin(connect()) })
}

/// Application state injected into handlers.
pub struct AppState<S> {
    slot: Arc<RwLock<Option<Arc<S>>>>,
    connector: Option<Connector<S>>,
    /// Balance check applied to every run, if configured.
    pub balances: Option<Arc<BalanceClient>>,
    /// Held for the duration of a run; only one run at a time.
    pub run_lock: Arc<Mutex<()>>,
    pub shutdown: Arc<Shutdown>,
}

impl<S> AppState<S> {
    pub fn new(session: Option<S>, shutdown: Arc<Shutdown>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(session.map(Arc::new))),
            connector: None,
            balances: None,
            run_lock: Arc::new(Mutex::new(())),
            shutdown,
        }
    }

    /// Reconnect through `connector` whenever no session is held.
    pub fn with_connector(mut self, connector: Connector<S>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_balance_check(mut self, client: BalanceClient) -> Self {
        self.balances = Some(Arc::new(client));
        self
    }

    /// The session currently held, without reconnecting.
    pub async fn current_session(&self) -> Option<Arc<S>> {
        self.slot.read().await.clone()
    }

    /// The held session, or a fresh one from the connector.
    pub async fn session(&self) -> Option<Arc<S>> {
        if let Some(session) = self.current_session().await {
            return Some(session);
        }
        let connector = self.connector.as_ref()?;

        let mut slot = self.slot.write().await;
        if let Some(session) = slot.as_ref() {
            return Some(session.clone());
        }
        match connector().await {
            Ok(session) => {
                tracing::info!("Signing session established");
                let session = Arc::new(session);
                *slot = Some(session.clone());
                Some(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Signing session still unavailable");
                None
            }
        }
    }

    /// Drop the held session so the next request reconnects. Without a
    /// connector the session is kept, since nothing could replace it.
    pub async fn invalidate_session(&self) {
        if self.connector.is_some() {
            *self.slot.write().await = None;
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            connector: self.connector.clone(),
            balances: self.balances.clone(),
            run_lock: self.run_lock.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router<S: SigningSession + 'static>(state: AppState<S>, max_body_size: usize) -> Router {
    Router::new()
        .route("/api/process-transfers", post(process_transfers::<S>))
        .route("/health", get(health::<S>))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id(request.headers()),
            )
        }))
        .layer(set_request_id_layer())
}

/// HTTP server for the transfer API.
pub struct HttpServer {
    router: Router,
    shutdown: Arc<Shutdown>,
}

impl HttpServer {
    pub fn new<S: SigningSession + 'static>(config: &ServerConfig, state: AppState<S>) -> Self {
        let shutdown = state.shutdown.clone();
        let router = build_router(state, config.max_body_size);
        Self { router, shutdown }
    }

    /// Run the server until shutdown is triggered.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut signal = self.shutdown.signal();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { signal.triggered().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
