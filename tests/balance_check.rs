//! Sender balance checks against a mock indexer.

use serde_json::json;
use std::time::Duration;

use token_disperse::balance::BalanceClient;
use token_disperse::observability::{LogLevel, MemorySink};
use token_disperse::transfer::{AccountName, Disperser, RunStatus, Symbol, TransferError};

mod common;
use common::{recipient, start_indexer, wax_config, ScriptedSession};

async fn indexer_with(amount: &str, decimals: &str) -> BalanceClient {
    let url = start_indexer(json!([
        { "contract": "alien.worlds", "currency": "TLM", "amount": "999.0000", "decimals": "4" },
        { "contract": "eosio.token", "currency": "WAX", "amount": amount, "decimals": decimals }
    ]))
    .await;
    BalanceClient::new(&url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_total_above_balance_is_refused() {
    let balances = indexer_with("2.00000000", "8").await;
    let session = ScriptedSession::new("treasury");
    let config = wax_config(10);
    let list = vec![recipient("alice", "1.5"), recipient("bob", "2")];
    let sink = MemorySink::new();

    let err = Disperser::new(&session, &config)
        .with_sink(&sink)
        .with_balance_check(&balances)
        .run(&list)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Total amount (3.5) exceeds your available balance (2.00000000)"
    );
    assert!(session.calls().is_empty());
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, LogLevel::Error);
}

#[tokio::test]
async fn test_balance_covering_total_runs() {
    let balances = indexer_with("3.50000000", "8").await;
    let session = ScriptedSession::new("treasury");
    let config = wax_config(10);
    let list = vec![recipient("alice", "1.5"), recipient("bob", "2")];
    let sink = MemorySink::new();

    let result = Disperser::new(&session, &config)
        .with_sink(&sink)
        .with_balance_check(&balances)
        .run(&list)
        .await
        .unwrap();

    assert_eq!(result.status(), RunStatus::Success);
    assert_eq!(session.calls().len(), 1);
    assert!(sink.events().iter().all(|e| e.level != LogLevel::Warning));
}

#[tokio::test]
async fn test_precision_mismatch_warns() {
    let balances = indexer_with("100.0000", "4").await;
    let session = ScriptedSession::new("treasury");
    let config = wax_config(10);
    let sink = MemorySink::new();

    let result = Disperser::new(&session, &config)
        .with_sink(&sink)
        .with_balance_check(&balances)
        .run(&[recipient("alice", "1")])
        .await
        .unwrap();

    assert_eq!(result.status(), RunStatus::Success);
    assert!(sink.events().iter().any(|e| e.level == LogLevel::Warning
        && e.message == "Configured precision 8 differs from WAX contract precision 4"));
}

#[tokio::test]
async fn test_token_not_held() {
    let url = start_indexer(json!([])).await;
    let balances = BalanceClient::new(&url, Duration::from_secs(5)).unwrap();
    let session = ScriptedSession::new("treasury");

    let err = Disperser::new(&session, &wax_config(10))
        .with_balance_check(&balances)
        .run(&[recipient("alice", "0.1")])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TransferError::InsufficientBalance {
            total: "0.1".to_string(),
            available: "0".to_string(),
        }
    );
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn test_unreachable_indexer_stops_the_run() {
    let balances = BalanceClient::new("http://127.0.0.1:1/api/balances/wax", Duration::from_secs(1)).unwrap();
    let session = ScriptedSession::new("treasury");

    let err = Disperser::new(&session, &wax_config(10))
        .with_balance_check(&balances)
        .run(&[recipient("alice", "1")])
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Balance(_)));
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn test_token_balance_lookup() {
    let balances = indexer_with("7.25000000", "8").await;
    let treasury = AccountName::new("treasury").unwrap();

    let wax = balances
        .token_balance(&treasury, &AccountName::new("eosio.token").unwrap(), &Symbol::new("WAX").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(wax.decimals, 8);
    assert_eq!(wax.available().unwrap().unwrap().to_string(), "7.25");

    let missing = balances
        .token_balance(&treasury, &AccountName::new("eosio.token").unwrap(), &Symbol::new("TLM").unwrap())
        .await
        .unwrap();
    assert_eq!(missing, None);
}
