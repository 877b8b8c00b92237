//! Landlord ledger.
//!
//! Append-only credits (confirmed payments) and debits (approved payouts)
//! per landlord and currency. Balances are folds over the entries.

pub mod balance;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod balance_props;

pub use balance::{LedgerBalance, RunningBalance};
pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{EntrySource, EntryType, NewLedgerEntry};
