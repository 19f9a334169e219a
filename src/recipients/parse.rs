//! Line-oriented recipient parsing.
//!
//! Accepted line shapes:
//! - `name,amount[,memo]`
//! - `name amount` (whitespace separated, no memo)
//!
//! Blank lines are ignored and a leading `receiverName,amount[,memo]` header
//! row is skipped.

use std::fmt;
use thiserror::Error;

use crate::transfer::account::is_valid_account_name;
use crate::transfer::amount::Amount;
use crate::transfer::types::{RecipientInstruction, MAX_MEMO_BYTES};
use crate::transfer::AccountName;

/// How many line errors the summary shows before collapsing the rest.
const SHOWN_ERRORS: usize = 3;

/// A problem on one input line. Line numbers are 1-based and count blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipientParseError {
    #[error("Please add at least one recipient")]
    Empty,

    #[error("{}", summarize(.0))]
    Invalid(Vec<LineError>),
}

impl RecipientParseError {
    /// Every line error, not just the summarized ones.
    pub fn line_errors(&self) -> &[LineError] {
        match self {
            RecipientParseError::Empty => &[],
            RecipientParseError::Invalid(errors) => errors,
        }
    }
}

fn summarize(errors: &[LineError]) -> String {
    let mut out = errors
        .iter()
        .take(SHOWN_ERRORS)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    if errors.len() > SHOWN_ERRORS {
        out.push_str(&format!("\n...and {} more errors", errors.len() - SHOWN_ERRORS));
    }
    out
}

fn is_header(fields: &[&str]) -> bool {
    fields.first().is_some_and(|f| f.eq_ignore_ascii_case("receivername"))
}

/// Parse `text` into recipients, in input order.
///
/// # Errors
/// [`RecipientParseError::Empty`] when there are no recipient lines, otherwise
/// [`RecipientParseError::Invalid`] with every bad line.
pub fn parse_recipients(text: &str) -> Result<Vec<RecipientInstruction>, RecipientParseError> {
    let mut recipients = Vec::new();
    let mut errors = Vec::new();
    let mut seen_content = false;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let number = index + 1;

        let fields: Vec<&str> = if line.contains(',') {
            line.split(',').map(str::trim).collect()
        } else {
            line.split_whitespace().collect()
        };

        if !seen_content {
            seen_content = true;
            if is_header(&fields) {
                continue;
            }
        }

        let mut push = |message: String| errors.push(LineError { line: number, message });

        let name = fields.first().copied().filter(|f| !f.is_empty());
        let amount = fields.get(1).copied().filter(|f| !f.is_empty());

        let receiver = match name {
            None => {
                push("Missing receiver name".to_string());
                None
            }
            Some(name) if !is_valid_account_name(name) => {
                push(format!("Invalid account name \"{}\"", name));
                None
            }
            Some(name) => AccountName::new(name).ok(),
        };

        let amount = match amount {
            None => {
                push("Missing amount".to_string());
                None
            }
            Some(raw) => match raw.parse::<Amount>() {
                Ok(amount) => Some(amount),
                Err(_) => {
                    push(format!("Invalid amount \"{}\"", raw));
                    None
                }
            },
        };

        let memo = match fields.get(2).copied().filter(|m| line.contains(',') && !m.is_empty()) {
            Some(memo) if memo.len() > MAX_MEMO_BYTES => {
                push(format!("Memo exceeds {} bytes", MAX_MEMO_BYTES));
                None
            }
            memo => Some(memo),
        };

        if let (Some(receiver), Some(amount), Some(memo)) = (receiver, amount, memo) {
            let mut recipient = RecipientInstruction::new(receiver, amount);
            if let Some(memo) = memo {
                recipient = recipient.with_memo(memo);
            }
            recipients.push(recipient);
        }
    }

    if !errors.is_empty() {
        return Err(RecipientParseError::Invalid(errors));
    }
    if recipients.is_empty() {
        return Err(RecipientParseError::Empty);
    }
    Ok(recipients)
}

/// Exact sum of all amounts; `None` for an empty list or on overflow.
pub fn total_amount(recipients: &[RecipientInstruction]) -> Option<Amount> {
    let mut iter = recipients.iter().map(|r| r.amount);
    let first = iter.next()?;
    iter.try_fold(first, Amount::checked_add)
}
