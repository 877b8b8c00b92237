//! Payment domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use rentflow_shared::types::{InvoiceId, Money, PaymentId, UserId};

use crate::invoice::InvoiceAction;
use crate::ledger::NewLedgerEntry;

/// Payment status.
///
/// Valid transitions:
/// - Submitted → Confirmed (staff or provider confirmation)
/// - Submitted → Failed
///
/// Confirmed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting confirmation.
    Submitted,
    /// Settled; has a receipt and a ledger credit.
    Confirmed,
    /// Rejected; no side effects.
    Failed,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submitted" | "pending" => Some(Self::Submitted),
            "confirmed" => Some(Self::Confirmed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true for states with no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who confirmed a payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfirmationSource {
    /// A staff member through the API.
    Staff,
    /// A payment provider webhook, by provider name.
    Provider(String),
}

impl ConfirmationSource {
    /// Stored form: `staff` or `provider:<name>`.
    #[must_use]
    pub fn to_stored(&self) -> String {
        match self {
            Self::Staff => "staff".to_string(),
            Self::Provider(name) => format!("provider:{name}"),
        }
    }

    /// Parses the stored form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.split_once(':') {
            None if s == "staff" => Some(Self::Staff),
            Some(("provider", name)) if !name.is_empty() => Some(Self::Provider(name.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ConfirmationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_stored())
    }
}

/// Point-in-time view of a payment used by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSnapshot {
    /// Payment id.
    pub id: PaymentId,
    /// Invoice being paid.
    pub invoice_id: InvoiceId,
    /// Paying tenant.
    pub payer_id: UserId,
    /// Amount paid.
    pub amount: Money,
    /// Current status.
    pub status: PaymentStatus,
}

/// Input for a tenant payment submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPaymentInput {
    /// Invoice being paid.
    pub invoice_id: InvoiceId,
    /// Paying tenant.
    pub payer_id: UserId,
    /// Amount and currency as submitted.
    pub amount: Money,
    /// Bank or wallet reference quoted by the tenant.
    pub reference: String,
}

/// Receipt stamped when a payment is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReceipt {
    /// Confirmed payment.
    pub payment_id: PaymentId,
    /// Settled invoice.
    pub invoice_id: InvoiceId,
    /// Amount received.
    pub amount: Money,
    /// Stamp time.
    pub issued_at: DateTime<Utc>,
}

/// All writes a confirmation performs, applied in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationEffects {
    /// Confirmation time.
    pub confirmed_at: DateTime<Utc>,
    /// Confirming staff member; `None` for provider confirmations.
    pub confirmed_by: Option<UserId>,
    /// Confirmation channel.
    pub source: ConfirmationSource,
    /// Invoice transition to paid.
    pub invoice_action: InvoiceAction,
    /// Receipt to insert.
    pub receipt: NewReceipt,
    /// Landlord credit to append.
    pub credit: NewLedgerEntry,
}

/// Outcome of planning a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationPlan {
    /// The payment was confirmed earlier. Nothing to do.
    AlreadyConfirmed,
    /// Another payment settled the invoice. This payment stays submitted.
    AlreadyPaid,
    /// Apply these effects.
    Apply(Box<ConfirmationEffects>),
}

impl ConfirmationPlan {
    /// Returns true when the plan writes anything.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Apply(_))
    }
}

/// Outcome of planning a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePlan {
    /// The payment already failed. Nothing to do.
    AlreadyFailed,
    /// Mark the payment failed.
    Apply {
        /// Failure time.
        failed_at: DateTime<Utc>,
        /// Why it failed.
        reason: String,
    },
}
