//! Invoice domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use rentflow_shared::types::{InvoiceId, Money, UserId};

use super::number::InvoiceNumber;

/// Invoice status.
///
/// Valid transitions:
/// - Draft → Issued (issue)
/// - Issued → Overdue (sweep)
/// - Issued | Overdue → Paid (payment confirmation)
/// - Draft | Issued | Overdue → Void (administrative)
///
/// Paid and Void are terminal. Overdue never reverts to Issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Being prepared by the landlord; invisible to the tenant's payment flow.
    Draft,
    /// Issued with a number and awaiting payment. Also called "open".
    #[serde(alias = "open")]
    Issued,
    /// Settled by a confirmed payment.
    Paid,
    /// Past its due date without payment.
    Overdue,
    /// Cancelled administratively.
    Void,
}

impl InvoiceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Void => "void",
        }
    }

    /// Parses a status. `open` is accepted as a synonym of `issued`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "issued" | "open" => Some(Self::Issued),
            "paid" => Some(Self::Paid),
            "overdue" => Some(Self::Overdue),
            "void" | "voided" => Some(Self::Void),
            _ => None,
        }
    }

    /// Returns true for states with no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Void)
    }

    /// Returns true if a payment may settle the invoice.
    #[must_use]
    pub const fn accepts_payment(&self) -> bool {
        matches!(self, Self::Issued | Self::Overdue)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of an invoice used by the pure services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSnapshot {
    /// Invoice id.
    pub id: InvoiceId,
    /// Owner.
    pub landlord_id: UserId,
    /// Payer.
    pub tenant_id: UserId,
    /// Amount due.
    pub amount: Money,
    /// Current status.
    pub status: InvoiceStatus,
    /// Due date.
    pub due_date: NaiveDate,
    /// Number, once issued.
    pub number: Option<String>,
}

/// Input for creating a draft invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    /// Owner.
    pub landlord_id: UserId,
    /// Payer.
    pub tenant_id: UserId,
    /// Amount due.
    pub amount: Money,
    /// Due date.
    pub due_date: NaiveDate,
    /// Free-text description, e.g. "Rent March 2026".
    pub description: Option<String>,
}

/// A validated invoice transition with the data to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceAction {
    /// Draft → Issued.
    Issue {
        /// Always `Issued`.
        new_status: InvoiceStatus,
        /// Number to assign.
        number: InvoiceNumber,
        /// Issue timestamp.
        issued_at: DateTime<Utc>,
    },
    /// Issued → Overdue.
    MarkOverdue {
        /// Always `Overdue`.
        new_status: InvoiceStatus,
        /// Sweep timestamp.
        marked_at: DateTime<Utc>,
    },
    /// Issued | Overdue → Paid.
    MarkPaid {
        /// Always `Paid`.
        new_status: InvoiceStatus,
        /// Settlement timestamp.
        paid_at: DateTime<Utc>,
    },
    /// Any non-terminal status → Void.
    Void {
        /// Always `Void`.
        new_status: InvoiceStatus,
        /// Who voided it.
        voided_by: UserId,
        /// When.
        voided_at: DateTime<Utc>,
        /// Why.
        reason: String,
    },
}

impl InvoiceAction {
    /// Status after applying the action.
    #[must_use]
    pub const fn new_status(&self) -> InvoiceStatus {
        match self {
            Self::Issue { new_status, .. }
            | Self::MarkOverdue { new_status, .. }
            | Self::MarkPaid { new_status, .. }
            | Self::Void { new_status, .. } => *new_status,
        }
    }
}
