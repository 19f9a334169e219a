//! Normalization of signer responses and failures.
//!
//! Every way an authorize-and-broadcast call can go wrong is mapped here to a
//! single [`SessionFailure`]. The ledger's own error object wins over generic
//! transport messages.

use reqwest::StatusCode;
use serde_json::Value;

use crate::session::types::{FailureKind, SessionFailure};

/// Where a transaction id may sit in a signer response.
const TRANSACTION_ID_POINTERS: &[&str] = &[
    "/transaction_id",
    "/response/transaction_id",
    "/resolved/transaction_id",
    "/processed/id",
];

/// Longest slice of a raw, non-JSON body kept in an error message.
const MAX_RAW_BODY_CHARS: usize = 200;

/// Pull the transaction id out of a successful response, if it has one.
pub fn extract_transaction_id(body: &Value) -> Option<String> {
    TRANSACTION_ID_POINTERS
        .iter()
        .filter_map(|p| body.pointer(p))
        .filter_map(Value::as_str)
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

/// Classify a transport-level error from the HTTP client.
pub fn classify_transport(err: &reqwest::Error) -> SessionFailure {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_connect() || err.is_request() {
        FailureKind::Network
    } else {
        FailureKind::Unknown
    };
    SessionFailure::new(kind, err.to_string())
}

/// Classify a non-success HTTP response from the signer.
pub fn classify_response(status: StatusCode, body: &str) -> SessionFailure {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if let Some(ledger_error) = parsed.as_ref().and_then(|v| v.get("error")).filter(|e| e.is_object()) {
        let kind = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FailureKind::Rejected,
            _ => FailureKind::Ledger,
        };
        return SessionFailure::new(kind, describe_ledger_error(ledger_error));
    }

    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FailureKind::Rejected,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FailureKind::Timeout,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            FailureKind::Network
        }
        _ => FailureKind::Unknown,
    };

    let message = parsed
        .as_ref()
        .and_then(|v| v.get("details").and_then(describe_details).or_else(|| string_field(v, "message")))
        .unwrap_or_else(|| {
            let raw = body.trim();
            if raw.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                let raw: String = raw.chars().take(MAX_RAW_BODY_CHARS).collect();
                format!("HTTP {}: {}", status.as_u16(), raw)
            }
        });

    SessionFailure::new(kind, message)
}

/// `what: first detail` for ledger error objects, the raw JSON otherwise.
fn describe_ledger_error(error: &Value) -> String {
    let what = string_field(error, "what").or_else(|| string_field(error, "name"));
    let detail = error.get("details").and_then(describe_details);
    match (what, detail) {
        (Some(what), Some(detail)) => format!("{what}: {detail}"),
        (Some(what), None) => what,
        (None, Some(detail)) => detail,
        (None, None) => error.to_string(),
    }
}

fn describe_details(details: &Value) -> Option<String> {
    match details {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .find_map(|item| string_field(item, "message").or_else(|| item.as_str().map(str::to_string))),
        Value::Object(_) => string_field(details, "message"),
        _ => None,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
