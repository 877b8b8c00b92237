//! Balance folds over ledger entries.
//!
//! The balance of a (landlord, currency) pair is the sum of credits minus
//! the sum of debits. Entries are only ever appended, so the fold is the
//! single source of truth; running balances on stored rows are an audit
//! trail.

use serde::{Deserialize, Serialize};

use rentflow_shared::types::{Currency, UserId};

use crate::ledger::error::LedgerError;
use crate::ledger::types::EntryType;

/// Folded balance for one landlord in one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBalance {
    /// Landlord.
    pub landlord_id: UserId,
    /// Currency.
    pub currency: Currency,
    /// Sum of credit amounts.
    pub credit_total: i64,
    /// Sum of debit amounts.
    pub debit_total: i64,
    /// `credit_total - debit_total`.
    pub balance: i64,
}

impl LedgerBalance {
    /// An empty balance.
    #[must_use]
    pub const fn new(landlord_id: UserId, currency: Currency) -> Self {
        Self {
            landlord_id,
            currency,
            credit_total: 0,
            debit_total: 0,
            balance: 0,
        }
    }

    /// Folds one entry into the balance.
    ///
    /// Totals only grow, so overflow depends on the entry set and never on
    /// its order.
    pub fn apply(&mut self, entry_type: EntryType, amount_minor: i64) -> Result<(), LedgerError> {
        if amount_minor <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount_minor));
        }
        match entry_type {
            EntryType::Credit => {
                self.credit_total = self
                    .credit_total
                    .checked_add(amount_minor)
                    .ok_or(LedgerError::Overflow)?;
            }
            EntryType::Debit => {
                self.debit_total = self
                    .debit_total
                    .checked_add(amount_minor)
                    .ok_or(LedgerError::Overflow)?;
            }
        }
        self.balance = self
            .credit_total
            .checked_sub(self.debit_total)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Folds a set of `(type, amount)` pairs.
    pub fn from_entries<I>(
        landlord_id: UserId,
        currency: Currency,
        entries: I,
    ) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = (EntryType, i64)>,
    {
        let mut balance = Self::new(landlord_id, currency);
        for (entry_type, amount) in entries {
            balance.apply(entry_type, amount)?;
        }
        Ok(balance)
    }
}

/// Running balance stamped on each stored entry.
///
/// - `account_version` increases by one per entry
/// - `previous_balance` equals the prior entry's `current_balance`
/// - `current_balance = previous_balance + signed amount`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Position of the entry within its account.
    pub account_version: i64,
    /// Balance before this entry.
    pub previous_balance: i64,
    /// Balance after this entry.
    pub current_balance: i64,
}

impl RunningBalance {
    /// Running balance for the first entry of an account.
    pub fn first_entry(signed_amount: i64) -> Self {
        Self {
            account_version: 1,
            previous_balance: 0,
            current_balance: signed_amount,
        }
    }

    /// Running balance following `previous`.
    pub fn next_entry(previous: &Self, signed_amount: i64) -> Result<Self, LedgerError> {
        Ok(Self {
            account_version: previous.account_version + 1,
            previous_balance: previous.current_balance,
            current_balance: previous
                .current_balance
                .checked_add(signed_amount)
                .ok_or(LedgerError::Overflow)?,
        })
    }
}
