//! Payout errors.

use thiserror::Error;

use rentflow_shared::types::PayoutId;

use crate::access::AccessError;
use crate::ledger::LedgerError;
use crate::payout::types::PayoutStatus;

/// Errors that can occur while requesting or deciding payouts.
#[derive(Debug, Error)]
pub enum PayoutError {
    /// Payout not found.
    #[error("Payout {0} not found")]
    NotFound(PayoutId),

    /// The payout was already decided differently.
    #[error("Payout is already {status}")]
    AlreadyDecided {
        /// Current status.
        status: PayoutStatus,
    },

    /// Approval would take the balance below zero.
    #[error("Insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance {
        /// Folded balance.
        available: i64,
        /// Payout amount.
        requested: i64,
    },

    /// Amount must be positive.
    #[error("Payout amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Ledger posting failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Caller may not act on the payout.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PayoutError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::AlreadyDecided { .. } => 409,
            Self::InsufficientBalance { .. } | Self::InvalidAmount(_) => 422,
            Self::Ledger(e) => e.status_code(),
            Self::Access(e) => e.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "PAYOUT_NOT_FOUND",
            Self::AlreadyDecided { .. } => "ALREADY_DECIDED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Ledger(e) => e.error_code(),
            Self::Access(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
