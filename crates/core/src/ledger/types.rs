//! Ledger domain types.

use serde::{Deserialize, Serialize};
use std::fmt;

use rentflow_shared::types::{Money, PaymentId, PayoutId, UserId};

/// Direction of a ledger entry from the landlord's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money owed to the landlord (a confirmed tenant payment).
    Credit,
    /// Money paid out to the landlord.
    Debit,
}

impl EntryType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }

    /// Parses an entry type.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" => Some(Self::Credit),
            "debit" => Some(Self::Debit),
            _ => None,
        }
    }

    /// `+1` for credits, `-1` for debits.
    #[must_use]
    pub const fn sign(&self) -> i64 {
        match self {
            Self::Credit => 1,
            Self::Debit => -1,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What produced a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// A confirmed tenant payment.
    Payment,
    /// An approved payout.
    Payout,
}

impl EntrySource {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Payout => "payout",
        }
    }

    /// Parses a source.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "payment" => Some(Self::Payment),
            "payout" => Some(Self::Payout),
            _ => None,
        }
    }
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    /// Landlord whose balance moves.
    pub landlord_id: UserId,
    /// Unsigned amount; the direction comes from `entry_type`.
    pub amount: Money,
    /// Credit or debit.
    pub entry_type: EntryType,
    /// Producing flow.
    pub source: EntrySource,
    /// Back-reference when `source` is `Payment`.
    pub payment_id: Option<PaymentId>,
    /// Back-reference when `source` is `Payout`.
    pub payout_id: Option<PayoutId>,
    /// Free-text memo.
    pub memo: Option<String>,
}

impl NewLedgerEntry {
    /// Amount with the entry's sign applied.
    #[must_use]
    pub const fn signed_amount(&self) -> i64 {
        self.amount.amount_minor * self.entry_type.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentflow_shared::types::Currency;

    #[test]
    fn test_signs() {
        assert_eq!(EntryType::Credit.sign(), 1);
        assert_eq!(EntryType::Debit.sign(), -1);
    }

    #[test]
    fn test_parse_round_trip() {
        for t in [EntryType::Credit, EntryType::Debit] {
            assert_eq!(EntryType::parse(t.as_str()), Some(t));
        }
        for s in [EntrySource::Payment, EntrySource::Payout] {
            assert_eq!(EntrySource::parse(s.as_str()), Some(s));
        }
        assert_eq!(EntryType::parse("refund"), None);
    }

    #[test]
    fn test_signed_amount() {
        let entry = NewLedgerEntry {
            landlord_id: UserId::new(),
            amount: Money::new(250_000, Currency::Pkr),
            entry_type: EntryType::Debit,
            source: EntrySource::Payout,
            payment_id: None,
            payout_id: Some(PayoutId::new()),
            memo: None,
        };
        assert_eq!(entry.signed_amount(), -250_000);
    }
}
