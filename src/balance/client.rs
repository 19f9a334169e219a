//! HTTP client for a light-API style balance indexer.
//!
//! # Protocol
//! - `GET {url}/{account}` → `{ "balances": [{ "contract", "currency", "amount", "decimals" }] }`
//!
//! `url` already names the chain, e.g.
//! `https://lightapi-wax.qaraqol.com/api/balances/wax`.

use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::transfer::account::{AccountName, Symbol};
use crate::transfer::amount::{Amount, AmountError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("Invalid balance URL: {0}")]
    Config(String),

    #[error("Failed to fetch balances: {0}")]
    Unavailable(String),

    #[error("Malformed balance response: {0}")]
    Malformed(String),
}

/// One token held by an account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenBalance {
    pub contract: String,
    pub currency: String,
    /// Balance as the indexer prints it, e.g. `"120.5000"`.
    pub amount: String,
    #[serde(deserialize_with = "number_or_string")]
    pub decimals: u8,
}

impl TokenBalance {
    /// The balance as an amount; `None` when it is zero.
    pub fn available(&self) -> Result<Option<Amount>, BalanceError> {
        match self.amount.parse::<Amount>() {
            Ok(amount) => Ok(Some(amount)),
            Err(AmountError::NotPositive) => Ok(None),
            Err(e) => Err(BalanceError::Malformed(format!("{} balance: {}", self.currency, e))),
        }
    }
}

/// Indexers disagree on whether `decimals` is a number or a string.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u8),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
struct BalancesResponse {
    #[serde(default)]
    balances: Vec<TokenBalance>,
}

/// Looks up token balances for an account.
#[derive(Debug, Clone)]
pub struct BalanceClient {
    client: reqwest::Client,
    base: Url,
}

impl BalanceClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, BalanceError> {
        let mut base = Url::parse(url).map_err(|e| BalanceError::Config(format!("'{}': {}", url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BalanceError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base })
    }

    /// Every token balance `account` holds.
    pub async fn balances(&self, account: &AccountName) -> Result<Vec<TokenBalance>, BalanceError> {
        let url = self
            .base
            .join(account.as_str())
            .map_err(|e| BalanceError::Config(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BalanceError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BalanceError::Unavailable(format!("HTTP {}", status.as_u16())));
        }

        let body: BalancesResponse = response
            .json()
            .await
            .map_err(|e| BalanceError::Malformed(e.to_string()))?;

        tracing::debug!(account = %account, tokens = body.balances.len(), "Fetched token balances");
        Ok(body.balances)
    }

    /// The balance of one token, or `None` when the account holds none of it.
    pub async fn token_balance(
        &self,
        account: &AccountName,
        contract: &AccountName,
        symbol: &Symbol,
    ) -> Result<Option<TokenBalance>, BalanceError> {
        let balances = self.balances(account).await?;
        Ok(balances
            .into_iter()
            .find(|b| b.contract == contract.as_str() && b.currency == symbol.as_str()))
    }
}
