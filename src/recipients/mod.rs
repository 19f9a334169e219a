//! Recipient list input.
//!
//! Turns pasted text or a CSV file into `RecipientInstruction`s, reporting
//! every bad line at once so the list can be fixed in one pass.

pub mod parse;

pub use parse::{parse_recipients, total_amount, LineError, RecipientParseError};
