//! Ledger entry construction and validation.

use rentflow_shared::types::{Currency, Money, PaymentId, PayoutId, UserId};

use crate::ledger::balance::RunningBalance;
use crate::ledger::error::LedgerError;
use crate::ledger::types::{EntrySource, EntryType, NewLedgerEntry};

/// Stateless service producing validated ledger entries.
pub struct LedgerService;

impl LedgerService {
    /// The credit posted when a tenant payment is confirmed.
    pub fn credit_for_payment(
        landlord_id: UserId,
        payment_id: PaymentId,
        amount: Money,
        memo: Option<String>,
    ) -> Result<NewLedgerEntry, LedgerError> {
        let entry = NewLedgerEntry {
            landlord_id,
            amount,
            entry_type: EntryType::Credit,
            source: EntrySource::Payment,
            payment_id: Some(payment_id),
            payout_id: None,
            memo,
        };
        Self::validate_entry(&entry)?;
        Ok(entry)
    }

    /// The debit posted when a payout is approved.
    pub fn debit_for_payout(
        landlord_id: UserId,
        payout_id: PayoutId,
        amount: Money,
        memo: Option<String>,
    ) -> Result<NewLedgerEntry, LedgerError> {
        let entry = NewLedgerEntry {
            landlord_id,
            amount,
            entry_type: EntryType::Debit,
            source: EntrySource::Payout,
            payment_id: None,
            payout_id: Some(payout_id),
            memo,
        };
        Self::validate_entry(&entry)?;
        Ok(entry)
    }

    /// Checks amount sign and back-reference shape.
    pub fn validate_entry(entry: &NewLedgerEntry) -> Result<(), LedgerError> {
        if !entry.amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(entry.amount.amount_minor));
        }
        let references_match = match entry.source {
            EntrySource::Payment => entry.payment_id.is_some() && entry.payout_id.is_none(),
            EntrySource::Payout => entry.payout_id.is_some() && entry.payment_id.is_none(),
        };
        if !references_match {
            return Err(LedgerError::SourceReferenceMismatch {
                entry_source: entry.source,
            });
        }
        Ok(())
    }

    /// Running balance for `entry` appended after `previous` on an account
    /// held in `account_currency`.
    pub fn next_running_balance(
        previous: Option<&RunningBalance>,
        account_currency: Currency,
        entry: &NewLedgerEntry,
    ) -> Result<RunningBalance, LedgerError> {
        Self::validate_entry(entry)?;
        if entry.amount.currency != account_currency {
            return Err(LedgerError::CurrencyMismatch {
                expected: account_currency,
                actual: entry.amount.currency,
            });
        }
        match previous {
            None => Ok(RunningBalance::first_entry(entry.signed_amount())),
            Some(prev) => RunningBalance::next_entry(prev, entry.signed_amount()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkr(amount: i64) -> Money {
        Money::new(amount, Currency::Pkr)
    }

    #[test]
    fn test_credit_for_payment() {
        let payment = PaymentId::new();
        let entry =
            LedgerService::credit_for_payment(UserId::new(), payment, pkr(250_000), None).unwrap();
        assert_eq!(entry.entry_type, EntryType::Credit);
        assert_eq!(entry.source, EntrySource::Payment);
        assert_eq!(entry.payment_id, Some(payment));
        assert_eq!(entry.signed_amount(), 250_000);
    }

    #[test]
    fn test_debit_for_payout() {
        let entry =
            LedgerService::debit_for_payout(UserId::new(), PayoutId::new(), pkr(1), None).unwrap();
        assert_eq!(entry.entry_type, EntryType::Debit);
        assert_eq!(entry.signed_amount(), -1);
    }

    #[test]
    fn test_rejects_zero_amount() {
        assert!(matches!(
            LedgerService::credit_for_payment(UserId::new(), PaymentId::new(), pkr(0), None),
            Err(LedgerError::NonPositiveAmount(0))
        ));
    }

    #[test]
    fn test_rejects_mismatched_reference() {
        let mut entry =
            LedgerService::credit_for_payment(UserId::new(), PaymentId::new(), pkr(5), None)
                .unwrap();
        entry.payout_id = Some(PayoutId::new());
        assert!(matches!(
            LedgerService::validate_entry(&entry),
            Err(LedgerError::SourceReferenceMismatch { .. })
        ));
    }

    #[test]
    fn test_next_running_balance() {
        let landlord = UserId::new();
        let credit =
            LedgerService::credit_for_payment(landlord, PaymentId::new(), pkr(300), None).unwrap();
        let debit =
            LedgerService::debit_for_payout(landlord, PayoutId::new(), pkr(100), None).unwrap();

        let first = LedgerService::next_running_balance(None, Currency::Pkr, &credit).unwrap();
        let second =
            LedgerService::next_running_balance(Some(&first), Currency::Pkr, &debit).unwrap();
        assert_eq!(first.current_balance, 300);
        assert_eq!(second.account_version, 2);
        assert_eq!(second.current_balance, 200);

        assert!(matches!(
            LedgerService::next_running_balance(None, Currency::Usd, &credit),
            Err(LedgerError::CurrencyMismatch { .. })
        ));
    }
}
