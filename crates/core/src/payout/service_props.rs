//! Property-based tests for payout conservation.

use proptest::prelude::*;

use rentflow_shared::types::{Currency, Money, PayoutId, UserId};

use crate::ledger::{EntryType, LedgerBalance};
use crate::payout::service::PayoutEngine;
use crate::payout::types::{PayoutAction, PayoutDecision, PayoutPlan, PayoutSnapshot, PayoutStatus};

/// Folds `credits` and, if the plan approves, the resulting debit.
fn balance_after(
    landlord: UserId,
    credits: &[i64],
    plan: &PayoutPlan,
) -> LedgerBalance {
    let mut entries: Vec<(EntryType, i64)> =
        credits.iter().map(|c| (EntryType::Credit, *c)).collect();
    if let PayoutPlan::Apply(PayoutAction::Approve { debit, .. }) = plan {
        entries.push((debit.entry_type, debit.amount.amount_minor));
    }
    LedgerBalance::from_entries(landlord, Currency::Pkr, entries).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approving X lowers the balance by X; denying leaves it unchanged.
    #[test]
    fn prop_payout_conserves_balance(
        credits in prop::collection::vec(1i64..1_000_000, 1..20),
        fraction in 1i64..=100,
        approve in any::<bool>(),
    ) {
        let landlord = UserId::new();
        let before = LedgerBalance::from_entries(
            landlord,
            Currency::Pkr,
            credits.iter().map(|c| (EntryType::Credit, *c)),
        )
        .unwrap();
        let requested = (before.balance * fraction / 100).max(1);
        let payout = PayoutSnapshot {
            id: PayoutId::new(),
            landlord_id: landlord,
            amount: Money::new(requested, Currency::Pkr),
            status: PayoutStatus::Pending,
        };
        let decision = if approve { PayoutDecision::Approve } else { PayoutDecision::Deny };

        PayoutEngine::ensure_funds(before.balance, requested).unwrap();
        let plan = PayoutEngine::plan_decision(&payout, decision, UserId::new(), None).unwrap();
        let after = balance_after(landlord, &credits, &plan);

        if approve {
            prop_assert_eq!(after.balance, before.balance - requested);
            prop_assert!(after.balance >= 0);
        } else {
            prop_assert_eq!(after.balance, before.balance);
        }
    }

    /// Funds checks reject exactly the requests above the balance.
    #[test]
    fn prop_ensure_funds_threshold(available in -1_000i64..1_000_000, requested in 1i64..1_000_000) {
        let ok = PayoutEngine::ensure_funds(available, requested).is_ok();
        prop_assert_eq!(ok, available >= requested);
    }
}
