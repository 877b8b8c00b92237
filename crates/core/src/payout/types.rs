//! Payout domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use rentflow_shared::types::{Money, PayoutId, UserId};

use crate::ledger::NewLedgerEntry;

/// Payout request status. Approved and Denied are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    /// Awaiting a staff decision.
    Pending,
    /// Paid out; debited from the ledger.
    Approved,
    /// Refused; no ledger effect.
    Denied,
}

impl PayoutStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }

    /// Parses a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "denied" | "rejected" => Some(Self::Denied),
            _ => None,
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staff decision on a pending payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutDecision {
    /// Pay out and debit the ledger.
    Approve,
    /// Refuse.
    Deny,
}

impl PayoutDecision {
    /// Status the payout ends in.
    #[must_use]
    pub const fn resulting_status(&self) -> PayoutStatus {
        match self {
            Self::Approve => PayoutStatus::Approved,
            Self::Deny => PayoutStatus::Denied,
        }
    }

    /// Parses a decision.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" | "approved" => Some(Self::Approve),
            "deny" | "denied" | "reject" => Some(Self::Deny),
            _ => None,
        }
    }
}

/// Point-in-time view of a payout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutSnapshot {
    /// Payout id.
    pub id: PayoutId,
    /// Requesting landlord.
    pub landlord_id: UserId,
    /// Requested amount.
    pub amount: Money,
    /// Current status.
    pub status: PayoutStatus,
}

/// A validated payout decision with the data to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutAction {
    /// Pending → Approved, with the debit to append.
    Approve {
        /// Deciding staff member.
        decided_by: UserId,
        /// Decision time.
        decided_at: DateTime<Utc>,
        /// Decision notes.
        notes: Option<String>,
        /// Ledger debit.
        debit: NewLedgerEntry,
    },
    /// Pending → Denied.
    Deny {
        /// Deciding staff member.
        decided_by: UserId,
        /// Decision time.
        decided_at: DateTime<Utc>,
        /// Decision notes.
        notes: Option<String>,
    },
}

impl PayoutAction {
    /// Status after applying the action.
    #[must_use]
    pub const fn new_status(&self) -> PayoutStatus {
        match self {
            Self::Approve { .. } => PayoutStatus::Approved,
            Self::Deny { .. } => PayoutStatus::Denied,
        }
    }
}

/// Outcome of planning a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutPlan {
    /// The same decision was already taken. Nothing to do.
    Unchanged,
    /// Apply this action.
    Apply(PayoutAction),
}
