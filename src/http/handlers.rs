//! API handlers.
//!
//! # Endpoints
//! - `POST /api/process-transfers` runs one transfer and returns its result
//!   together with the run's log events
//! - `GET /health` reports liveness, the signing account and whether a run
//!   is in progress

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::{LogEvent, MemorySink};
use crate::session::SigningSession;
use crate::transfer::{
    check_memos, Disperser, RecipientInstruction, RunStatus, TransferConfig, TransferError, TransferResult,
};

/// Body of `POST /api/process-transfers`.
///
/// `config` stays raw until [`parse_config`] so that missing fields get a
/// configuration error rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct ProcessTransfersRequest {
    pub config: Option<Value>,
    pub recipients: Option<Vec<RecipientInstruction>>,
}

/// Fields a transfer configuration must carry; only `defaultMemo` may be left out.
const REQUIRED_CONFIG_FIELDS: [&str; 5] = ["senderName", "contractName", "tokenName", "tokenPrecision", "batchSize"];

fn parse_config(raw: Value) -> Result<TransferConfig, TransferError> {
    let missing: Vec<&str> = REQUIRED_CONFIG_FIELDS
        .into_iter()
        .filter(|field| raw.get(field).is_none_or(Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(TransferError::InvalidConfiguration(format!(
            "Missing required configuration parameters: {}",
            missing.join(", ")
        )));
    }
    let config: TransferConfig =
        serde_json::from_value(raw).map_err(|e| TransferError::InvalidConfiguration(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTransfersResponse {
    pub status: RunStatus,
    pub result: TransferResult,
    pub logs: Vec<LogEvent>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogEvent>,
}

fn error_response(status: StatusCode, error: impl Into<String>, logs: Vec<LogEvent>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
            logs,
        }),
    )
        .into_response()
}

pub async fn process_transfers<S: SigningSession + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    payload: Result<Json<ProcessTransfersRequest>, JsonRejection>,
) -> Response {
    let request_id = request_id(&headers).to_string();

    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!(request_id = %request_id, error = %rejection.body_text(), "Rejected transfer request body");
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            return error_response(status, rejection.body_text(), Vec::new());
        }
    };

    let (raw_config, recipients) = match (request.config, request.recipients) {
        (Some(config), Some(recipients)) if !recipients.is_empty() => (config, recipients),
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid request: missing configuration or recipients",
                Vec::new(),
            )
        }
    };

    let config = match parse_config(raw_config) {
        Ok(config) => config,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string(), Vec::new()),
    };
    if let Err(e) = check_memos(&recipients) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string(), Vec::new());
    }

    let Some(session) = state.session().await else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "No active session", Vec::new());
    };

    let Ok(_guard) = state.run_lock.try_lock() else {
        tracing::warn!(request_id = %request_id, "Transfer request refused: a run is already in progress");
        return error_response(StatusCode::CONFLICT, "A transfer run is already in progress", Vec::new());
    };

    tracing::info!(
        request_id = %request_id,
        recipients = recipients.len(),
        batch_size = config.batch_size,
        "Processing transfer request"
    );

    let sink = MemorySink::new();
    let mut disperser = Disperser::new(session.as_ref(), &config)
        .with_sink(&sink)
        .with_shutdown(state.shutdown.signal());
    if let Some(balances) = state.balances.as_deref() {
        disperser = disperser.with_balance_check(balances);
    }
    let outcome = disperser.run(&recipients).await;

    match outcome {
        Ok(result) => (
            StatusCode::OK,
            Json(ProcessTransfersResponse {
                status: result.status(),
                result,
                logs: sink.into_events(),
            }),
        )
            .into_response(),
        Err(e @ (TransferError::InvalidConfiguration(_) | TransferError::InsufficientBalance { .. })) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string(), sink.into_events())
        }
        Err(e @ TransferError::Session(_)) => {
            state.invalidate_session().await;
            error_response(StatusCode::FORBIDDEN, e.to_string(), sink.into_events())
        }
        Err(e @ TransferError::Balance(_)) => {
            error_response(StatusCode::BAD_GATEWAY, e.to_string(), sink.into_events())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub account: Option<String>,
    pub busy: bool,
}

pub async fn health<S: SigningSession + 'static>(State(state): State<AppState<S>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        account: state.current_session().await.map(|s| s.actor().to_string()),
        busy: state.run_lock.try_lock().is_err(),
    })
}
