//! Payment reconciliation errors.

use thiserror::Error;

use rentflow_shared::types::{Currency, InvoiceId, PaymentId, UserId};

use crate::access::AccessError;
use crate::invoice::{InvoiceError, InvoiceStatus};
use crate::ledger::LedgerError;
use crate::payment::types::PaymentStatus;

/// Errors that can occur while submitting, confirming or failing payments.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Payment not found.
    #[error("Payment {0} not found")]
    PaymentNotFound(PaymentId),

    /// Invoice not found.
    #[error("Invoice {0} not found")]
    InvoiceNotFound(InvoiceId),

    /// The payer is not the invoice's tenant.
    #[error("User {payer_id} is not the tenant of invoice {invoice_id}")]
    Forbidden {
        /// Submitting user.
        payer_id: UserId,
        /// Target invoice.
        invoice_id: InvoiceId,
    },

    /// Payment currency differs from the invoice currency.
    #[error("Currency mismatch: invoice is {invoice}, payment is {payment}")]
    CurrencyMismatch {
        /// Invoice currency.
        invoice: Currency,
        /// Payment currency.
        payment: Currency,
    },

    /// The invoice is already settled.
    #[error("Invoice {0} is already paid")]
    AlreadyPaid(InvoiceId),

    /// The invoice is not in a payable state.
    #[error("Invoice in status {status} does not accept payments")]
    InvoiceNotPayable {
        /// Invoice status.
        status: InvoiceStatus,
    },

    /// Amount must be positive.
    #[error("Payment amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Amount differs from the invoice amount.
    #[error("Payment amount {actual} does not settle invoice amount {expected}")]
    AmountMismatch {
        /// Invoice amount.
        expected: i64,
        /// Submitted amount.
        actual: i64,
    },

    /// Reference is blank.
    #[error("Payment reference is required")]
    ReferenceRequired,

    /// Reference exceeds the stored length.
    #[error("Payment reference is {actual} characters, at most {max} allowed")]
    ReferenceTooLong {
        /// Limit.
        max: usize,
        /// Submitted length.
        actual: usize,
    },

    /// Failure reason is blank.
    #[error("Failure reason is required")]
    FailureReasonRequired,

    /// Confirmation requires a submitted payment.
    #[error("Payment is {status}, only submitted payments can be confirmed")]
    NotSubmitted {
        /// Current status.
        status: PaymentStatus,
    },

    /// Attempted a transition the payment lifecycle does not allow.
    #[error("Invalid payment transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: PaymentStatus,
        /// Attempted target status.
        to: PaymentStatus,
    },

    /// Invoice transition failed.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Ledger posting failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Caller may not act on the payment.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PaymentError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ReferenceRequired | Self::ReferenceTooLong { .. } | Self::FailureReasonRequired => {
                400
            }
            Self::Forbidden { .. } => 403,
            Self::PaymentNotFound(_) | Self::InvoiceNotFound(_) => 404,
            Self::AlreadyPaid(_)
            | Self::InvoiceNotPayable { .. }
            | Self::NotSubmitted { .. }
            | Self::InvalidTransition { .. } => 409,
            Self::CurrencyMismatch { .. } | Self::InvalidAmount(_) | Self::AmountMismatch { .. } => {
                422
            }
            Self::Invoice(e) => e.status_code(),
            Self::Ledger(e) => e.status_code(),
            Self::Access(e) => e.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::AlreadyPaid(_) => "ALREADY_PAID",
            Self::InvoiceNotPayable { .. } => "INVOICE_NOT_PAYABLE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Self::ReferenceRequired => "REFERENCE_REQUIRED",
            Self::ReferenceTooLong { .. } => "REFERENCE_TOO_LONG",
            Self::FailureReasonRequired => "FAILURE_REASON_REQUIRED",
            Self::NotSubmitted { .. } => "NOT_SUBMITTED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Invoice(e) => e.error_code(),
            Self::Ledger(e) => e.error_code(),
            Self::Access(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
