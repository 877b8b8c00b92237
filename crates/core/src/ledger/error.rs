//! Ledger error types.

use thiserror::Error;

use rentflow_shared::types::Currency;

use crate::ledger::types::EntrySource;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Entry amounts are strictly positive; direction is the entry type.
    #[error("Ledger entry amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// Back-reference does not match the entry source.
    #[error("Ledger entry from {entry_source} must reference exactly one {entry_source}")]
    SourceReferenceMismatch {
        /// Declared source.
        entry_source: EntrySource,
    },

    /// Entry currency differs from the account currency.
    #[error("Currency mismatch: account is {expected}, entry is {actual}")]
    CurrencyMismatch {
        /// Account currency.
        expected: Currency,
        /// Entry currency.
        actual: Currency,
    },

    /// Balance arithmetic left the `i64` range.
    #[error("Ledger balance overflow")]
    Overflow,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NonPositiveAmount(_) | Self::CurrencyMismatch { .. } => 422,
            Self::SourceReferenceMismatch { .. } | Self::Overflow | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "INVALID_AMOUNT",
            Self::SourceReferenceMismatch { .. } => "LEDGER_SOURCE_MISMATCH",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::Overflow => "LEDGER_OVERFLOW",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
