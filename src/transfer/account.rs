//! Ledger account names and token symbols.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length of a ledger account name.
pub const MAX_ACCOUNT_NAME_LEN: usize = 12;

/// Maximum length of a token symbol.
pub const MAX_SYMBOL_LEN: usize = 7;

/// Errors raised when a name or symbol does not follow the ledger's rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Invalid account name \"{0}\" (must be 1-12 chars, only a-z, 1-5, and .)")]
    InvalidAccount(String),

    #[error("Invalid token symbol \"{0}\" (must be 1-7 uppercase letters)")]
    InvalidSymbol(String),
}

/// A ledger account name: 1-12 characters drawn from `a-z`, `1-5` and `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        if is_valid_account_name(&name) {
            Ok(Self(name))
        } else {
            Err(NameError::InvalidAccount(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Check a candidate against the ledger's account naming rule.
pub fn is_valid_account_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_ACCOUNT_NAME_LEN
        && name
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'1'..=b'5' | b'.'))
}

impl TryFrom<String> for AccountName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::str::FromStr for AccountName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> Self {
        name.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A token symbol such as `TLM` or `WAX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Result<Self, NameError> {
        let symbol = symbol.into();
        let valid = !symbol.is_empty()
            && symbol.len() <= MAX_SYMBOL_LEN
            && symbol.bytes().all(|b| b.is_ascii_uppercase());
        if valid {
            Ok(Self(symbol))
        } else {
            Err(NameError::InvalidSymbol(symbol))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
