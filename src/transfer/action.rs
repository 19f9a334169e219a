//! Ledger transfer actions.
//!
//! The wire shape must match the token contract's `transfer` action exactly:
//!
//! ```text
//! { account, name: "transfer",
//!   authorization: [{ actor, permission }],
//!   data: { from, to, quantity: "<amount> <SYMBOL>", memo } }
//! ```

use serde::{Deserialize, Serialize};

use crate::transfer::account::{AccountName, Symbol};
use crate::transfer::amount::Amount;
use crate::transfer::planner::Batch;
use crate::transfer::types::{RecipientInstruction, TransferConfig};

/// Action name of the standard token transfer.
pub const TRANSFER_ACTION: &str = "transfer";

/// An actor and the permission it signs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: AccountName,
    pub permission: String,
}

/// Payload of a `transfer` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferData {
    pub from: AccountName,
    pub to: AccountName,
    pub quantity: String,
    pub memo: String,
}

/// One ledger action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub account: AccountName,
    pub name: String,
    pub authorization: Vec<PermissionLevel>,
    pub data: TransferData,
}

/// Format an amount as the ledger's asset string, e.g. `2.5000 TLM`.
pub fn format_quantity(amount: &Amount, precision: u8, symbol: &Symbol) -> String {
    format!("{} {}", amount.to_fixed(precision), symbol)
}

/// Build the transfer action for one recipient, signed by `sender`.
pub fn build_transfer_action(
    recipient: &RecipientInstruction,
    config: &TransferConfig,
    sender: &PermissionLevel,
) -> Action {
    Action {
        account: config.contract_name.clone(),
        name: TRANSFER_ACTION.to_string(),
        authorization: vec![sender.clone()],
        data: TransferData {
            from: sender.actor.clone(),
            to: recipient.receiver_name.clone(),
            quantity: format_quantity(&recipient.amount, config.token_precision, &config.token_name),
            memo: recipient.effective_memo(&config.default_memo).to_string(),
        },
    }
}

/// Build one action per recipient of a batch, in order.
pub fn build_batch_actions(
    batch: &Batch<'_>,
    config: &TransferConfig,
    sender: &PermissionLevel,
) -> Vec<Action> {
    batch
        .recipients
        .iter()
        .map(|r| build_transfer_action(r, config, sender))
        .collect()
}
