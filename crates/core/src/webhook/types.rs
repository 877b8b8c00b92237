//! Provider-neutral webhook events.

use serde::{Deserialize, Serialize};
use std::fmt;

use rentflow_shared::types::{InvoiceId, Money, PaymentId};

/// Payment status reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Funds captured.
    Succeeded,
    /// Payment declined or cancelled.
    Failed,
    /// Waiting on the payer (3-D Secure, OTP, ...).
    RequiresAction,
    /// In flight.
    Pending,
}

impl ProviderStatus {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::RequiresAction => "requires_action",
            Self::Pending => "pending",
        }
    }

    /// Parses a provider-neutral status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "succeeded" | "success" | "paid" | "captured" => Some(Self::Succeeded),
            "failed" | "failure" | "declined" => Some(Self::Failed),
            "requires_action" => Some(Self::RequiresAction),
            "pending" | "processing" => Some(Self::Pending),
            _ => None,
        }
    }

    /// Returns true when the status settles or fails the payment.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which payment an event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRef {
    /// A payment already recorded here.
    Known(PaymentId),
    /// A payment initiated at the provider, identified by its external id.
    External {
        /// Invoice being paid.
        invoice_id: InvoiceId,
        /// Provider-side payment id.
        external_id: String,
        /// Captured amount.
        amount: Money,
    },
}

/// A webhook delivery mapped onto the reconciliation vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    /// Provider path segment.
    pub provider: String,
    /// Provider event id, unique per provider.
    pub event_id: String,
    /// Provider event type as received.
    pub event_type: String,
    /// Mapped status.
    pub status: ProviderStatus,
    /// Target payment.
    pub payment_ref: PaymentRef,
    /// Decline message for failed events.
    pub failure_reason: Option<String>,
}
