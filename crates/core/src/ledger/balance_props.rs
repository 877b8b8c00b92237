//! Property-based tests for ledger balances.

use proptest::prelude::*;

use rentflow_shared::types::{Currency, UserId};

use super::balance::{LedgerBalance, RunningBalance};
use super::types::EntryType;

fn arb_entry() -> impl Strategy<Value = (EntryType, i64)> {
    (
        prop_oneof![Just(EntryType::Credit), Just(EntryType::Debit)],
        1i64..10_000_000,
    )
}

/// A set of entries together with a shuffled copy of it.
fn arb_entries_and_permutation()
-> impl Strategy<Value = (Vec<(EntryType, i64)>, Vec<(EntryType, i64)>)> {
    prop::collection::vec(arb_entry(), 0..60)
        .prop_flat_map(|entries| (Just(entries.clone()), Just(entries).prop_shuffle()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any permutation of the same entries folds to the same balance.
    #[test]
    fn prop_balance_is_order_independent(
        (entries, shuffled) in arb_entries_and_permutation()
    ) {
        let landlord = UserId::new();
        let a = LedgerBalance::from_entries(landlord, Currency::Pkr, entries).unwrap();
        let b = LedgerBalance::from_entries(landlord, Currency::Pkr, shuffled).unwrap();
        prop_assert_eq!(a, b);
    }

    /// The fold equals the plain signed sum.
    #[test]
    fn prop_balance_is_signed_sum(entries in prop::collection::vec(arb_entry(), 0..60)) {
        let expected: i64 = entries.iter().map(|(t, amount)| t.sign() * amount).sum();
        let balance = LedgerBalance::from_entries(UserId::new(), Currency::Usd, entries).unwrap();
        prop_assert_eq!(balance.balance, expected);
        prop_assert_eq!(balance.balance, balance.credit_total - balance.debit_total);
    }

    /// The last running balance in a chain equals the folded balance.
    #[test]
    fn prop_running_balance_matches_fold(entries in prop::collection::vec(arb_entry(), 1..60)) {
        let mut running: Option<RunningBalance> = None;
        for (entry_type, amount) in &entries {
            let signed = entry_type.sign() * amount;
            running = Some(match running {
                None => RunningBalance::first_entry(signed),
                Some(prev) => RunningBalance::next_entry(&prev, signed).unwrap(),
            });
        }
        let last = running.unwrap();
        let folded = LedgerBalance::from_entries(UserId::new(), Currency::Pkr, entries.clone()).unwrap();
        prop_assert_eq!(last.current_balance, folded.balance);
        prop_assert_eq!(last.account_version, i64::try_from(entries.len()).unwrap());
    }
}
