//! Invoice lifecycle errors.

use chrono::NaiveDate;
use thiserror::Error;

use rentflow_shared::types::{InvoiceId, UserId};

use crate::access::{AccessError, Role};
use crate::invoice::types::InvoiceStatus;

/// Errors that can occur during invoice operations.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Invoice not found or not visible to the caller.
    #[error("Invoice {0} not found")]
    NotFound(InvoiceId),

    /// Attempted a transition the state machine does not allow.
    #[error("Invalid invoice transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: InvoiceStatus,
        /// Attempted target status.
        to: InvoiceStatus,
    },

    /// The invoice is already paid.
    #[error("Invoice is already paid")]
    AlreadyPaid,

    /// The invoice is not past due yet.
    #[error("Invoice is due on {due_date}, not overdue on {today}")]
    NotYetDue {
        /// Due date.
        due_date: NaiveDate,
        /// Evaluation date.
        today: NaiveDate,
    },

    /// A number was already assigned.
    #[error("Invoice already has number {0}")]
    NumberAlreadyAssigned(String),

    /// Malformed invoice number.
    #[error("Invalid invoice number: {0}")]
    InvalidNumber(String),

    /// Could not find a free invoice number.
    #[error("Could not assign a unique invoice number after {attempts} attempts")]
    NumberExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// Void reason is required but not provided.
    #[error("Void reason is required")]
    VoidReasonRequired,

    /// Amount is zero or below.
    #[error("Invoice amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// Landlord and tenant are the same user.
    #[error("An invoice cannot bill its own landlord")]
    SelfBilling,

    /// A party does not exist or has the wrong role.
    #[error("User {user_id} is not a {expected}")]
    InvalidParty {
        /// Referenced user.
        user_id: UserId,
        /// Role the user must have.
        expected: Role,
    },

    /// Caller may not act on the invoice.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl InvoiceError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidNumber(_)
            | Self::VoidReasonRequired
            | Self::NonPositiveAmount(_)
            | Self::SelfBilling => 400,
            Self::Access(_) => 403,
            Self::NotFound(_) => 404,
            Self::InvalidParty { .. } => 422,
            Self::InvalidTransition { .. }
            | Self::AlreadyPaid
            | Self::NotYetDue { .. }
            | Self::NumberAlreadyAssigned(_) => 409,
            Self::NumberExhausted { .. } | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "INVOICE_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::AlreadyPaid => "ALREADY_PAID",
            Self::NotYetDue { .. } => "NOT_YET_DUE",
            Self::NumberAlreadyAssigned(_) => "NUMBER_ALREADY_ASSIGNED",
            Self::InvalidNumber(_) => "INVALID_INVOICE_NUMBER",
            Self::NumberExhausted { .. } => "INVOICE_NUMBER_EXHAUSTED",
            Self::VoidReasonRequired => "VOID_REASON_REQUIRED",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::SelfBilling => "SELF_BILLING",
            Self::InvalidParty { .. } => "INVALID_PARTY",
            Self::Access(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
