//! HTTP API tests, driven in-process through the router.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use token_disperse::balance::BalanceClient;
use token_disperse::http::{build_router, connector, AppState, X_REQUEST_ID};
use token_disperse::lifecycle::Shutdown;
use token_disperse::session::SessionError;
use token_disperse::transfer::MAX_MEMO_BYTES;

mod common;
use common::{start_indexer, ScriptedSession};

fn state(session: Option<ScriptedSession>) -> AppState<ScriptedSession> {
    AppState::new(session, Arc::new(Shutdown::new()))
}

fn app(state: AppState<ScriptedSession>) -> Router {
    build_router(state, 64 * 1024)
}

fn transfer_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/process-transfers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_body() -> Value {
    json!({
        "config": {
            "senderName": "treasury",
            "contractName": "eosio.token",
            "tokenName": "WAX",
            "tokenPrecision": 8,
            "defaultMemo": "airdrop",
            "batchSize": 10
        },
        "recipients": [
            { "receiverName": "alice", "amount": "1.5" },
            { "receiverName": "bob", "amount": 2, "memo": "gm" }
        ]
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_process_transfers_success() {
    let state = state(Some(ScriptedSession::new("treasury")));
    let session = state.session().await.unwrap();

    let response = app(state).oneshot(transfer_request(valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(&X_REQUEST_ID));

    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["result"]["success"], 2);
    assert_eq!(body["result"]["failed"], 0);
    assert_eq!(body["result"]["lastTxId"], "tx1");
    assert_eq!(body["result"]["batches"][0]["status"], "success");
    assert_eq!(body["result"]["batches"][0]["transactionId"], "tx1");
    assert_eq!(body["logs"][0]["message"], "Starting to process 2 transfers in batches of 10");
    assert_eq!(body["logs"][0]["level"], "info");

    let calls = session.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].actions[1].data.memo, "gm");
}

#[tokio::test]
async fn test_missing_or_empty_input_is_rejected() {
    let cases = [
        json!({ "recipients": valid_body()["recipients"] }),
        json!({ "config": valid_body()["config"] }),
        json!({ "config": valid_body()["config"], "recipients": [] }),
    ];
    for body in cases {
        let response = app(state(Some(ScriptedSession::new("treasury"))))
            .oneshot(transfer_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Invalid request: missing configuration or recipients");
    }
}

#[tokio::test]
async fn test_invalid_config_and_payload_rejected() {
    let mut body = valid_body();
    body["config"]["batchSize"] = json!(0);
    let response = app(state(Some(ScriptedSession::new("treasury"))))
        .oneshot(transfer_request(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Invalid configuration: batch size must be at least 1"
    );

    let mut body = valid_body();
    body["recipients"][0]["receiverName"] = json!("Not-An-Account");
    let response = app(state(Some(ScriptedSession::new("treasury"))))
        .oneshot(transfer_request(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let garbage = Request::builder()
        .method("POST")
        .uri("/api/process-transfers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(state(Some(ScriptedSession::new("treasury"))))
        .oneshot(garbage)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_sender_is_rejected() {
    let mut body = valid_body();
    body["config"].as_object_mut().unwrap().remove("senderName");
    let app_state = state(Some(ScriptedSession::new("treasury")));
    let session = app_state.session().await.unwrap();

    let response = app(app_state).oneshot(transfer_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Invalid configuration: Missing required configuration parameters: senderName"
    );
    assert!(session.calls().is_empty());

    let mut body = valid_body();
    body["config"]["senderName"] = Value::Null;
    body["config"].as_object_mut().unwrap().remove("batchSize");
    let response = app(state(Some(ScriptedSession::new("treasury"))))
        .oneshot(transfer_request(body))
        .await
        .unwrap();
    assert_eq!(
        json_body(response).await["error"],
        "Invalid configuration: Missing required configuration parameters: senderName, batchSize"
    );
}

#[tokio::test]
async fn test_oversize_recipient_memo_is_rejected() {
    let mut body = valid_body();
    body["recipients"][1]["memo"] = json!("m".repeat(MAX_MEMO_BYTES + 1));
    let state = state(Some(ScriptedSession::new("treasury")));
    let session = state.session().await.unwrap();

    let response = app(state).oneshot(transfer_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Invalid configuration: memo for recipient 2 (bob) exceeds 256 bytes"
    );
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn test_insufficient_balance_is_rejected() {
    let url = start_indexer(json!([
        { "contract": "eosio.token", "currency": "WAX", "amount": "3.00000000", "decimals": 8 }
    ]))
    .await;
    let state = state(Some(ScriptedSession::new("treasury")))
        .with_balance_check(BalanceClient::new(&url, Duration::from_secs(5)).unwrap());
    let session = state.session().await.unwrap();

    let response = app(state).oneshot(transfer_request(valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Total amount (3.5) exceeds your available balance (3.00000000)"
    );
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn test_session_is_reconnected_on_demand() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let state = state(None).with_connector(connector(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Err(SessionError::Unavailable("connection refused".to_string()))
            } else {
                Ok(ScriptedSession::new("treasury"))
            }
        }
    }));

    let response = app(state.clone()).oneshot(transfer_request(valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app(state.clone()).oneshot(transfer_request(valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);

    // The new session is kept for later requests.
    let response = app(state.clone()).oneshot(transfer_request(valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(state.current_session().await.unwrap().calls().len(), 2);
}

#[tokio::test]
async fn test_request_during_shutdown_submits_nothing() {
    let state = state(Some(ScriptedSession::new("treasury")));
    let session = state.session().await.unwrap();
    state.shutdown.trigger();

    let response = app(state).oneshot(transfer_request(valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["result"]["skipped"], 2);
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn test_sender_mismatch_is_forbidden() {
    let mut body = valid_body();
    body["config"]["senderName"] = json!("someoneelse");
    let state = state(Some(ScriptedSession::new("treasury")));
    let session = state.session().await.unwrap();

    let response = app(state).oneshot(transfer_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert!(body["logs"][0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Error processing transfers: Session error"));
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn test_no_session_is_unavailable() {
    let response = app(state(None)).oneshot(transfer_request(valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "No active session");
}

#[tokio::test]
async fn test_concurrent_run_is_refused() {
    let state = state(Some(ScriptedSession::new("treasury")));
    let lock = state.run_lock.clone();
    let _running = lock.lock().await;

    let response = app(state.clone()).oneshot(transfer_request(valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let health = app(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(json_body(health).await["busy"], true);
}

#[tokio::test]
async fn test_health() {
    let response = app(state(Some(ScriptedSession::new("treasury"))))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["account"], "treasury");
    assert_eq!(body["busy"], false);

    let response = app(state(None))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(json_body(response).await["account"], Value::Null);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header(&X_REQUEST_ID, "client-chosen-id")
        .body(Body::empty())
        .unwrap();
    let response = app(state(None)).oneshot(request).await.unwrap();
    assert_eq!(response.headers()[&X_REQUEST_ID], "client-chosen-id");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let big: Vec<Value> = (0..5_000)
        .map(|_| json!({ "receiverName": "alice", "amount": "1" }))
        .collect();
    let mut body = valid_body();
    body["recipients"] = Value::Array(big);

    let response = build_router(state(Some(ScriptedSession::new("treasury"))), 1024)
        .oneshot(transfer_request(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
