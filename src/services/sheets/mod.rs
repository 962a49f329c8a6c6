//! Remote ledger backed by a Google Sheets spreadsheet.

pub mod client;
pub mod types;
