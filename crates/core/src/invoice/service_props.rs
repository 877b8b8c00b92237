//! Property-based tests for the invoice state machine.

use chrono::NaiveDate;
use proptest::prelude::*;

use crate::invoice::error::InvoiceError;
use crate::invoice::number::InvoiceNumber;
use crate::invoice::service::InvoiceStateMachine;
use crate::invoice::types::InvoiceStatus;
use rentflow_shared::types::UserId;

fn arb_status() -> impl Strategy<Value = InvoiceStatus> {
    prop_oneof![
        Just(InvoiceStatus::Draft),
        Just(InvoiceStatus::Issued),
        Just(InvoiceStatus::Paid),
        Just(InvoiceStatus::Overdue),
        Just(InvoiceStatus::Void),
    ]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every successful operation lands on a state the transition table allows.
    #[test]
    fn prop_actions_follow_transition_table(
        status in arb_status(),
        due in arb_date(),
        today in arb_date(),
    ) {
        let number = InvoiceNumber::generate(today);
        let outcomes = [
            InvoiceStateMachine::issue(status, None, number).ok(),
            InvoiceStateMachine::mark_overdue(status, due, today).ok().flatten(),
            InvoiceStateMachine::mark_paid(status).ok(),
            InvoiceStateMachine::void(status, UserId::new(), "reason").ok(),
        ];
        for action in outcomes.into_iter().flatten() {
            prop_assert!(InvoiceStateMachine::is_valid_transition(status, action.new_status()));
        }
    }

    /// Paid invoices never become overdue, whatever the dates.
    #[test]
    fn prop_paid_is_never_overdue(due in arb_date(), today in arb_date()) {
        let result = InvoiceStateMachine::mark_overdue(InvoiceStatus::Paid, due, today);
        prop_assert!(matches!(result, Ok(None)));
    }

    /// Applying mark_overdue to its own output is a no-op.
    #[test]
    fn prop_mark_overdue_is_idempotent(due in arb_date(), today in arb_date()) {
        if let Ok(Some(action)) = InvoiceStateMachine::mark_overdue(InvoiceStatus::Issued, due, today) {
            let again = InvoiceStateMachine::mark_overdue(action.new_status(), due, today);
            prop_assert!(matches!(again, Ok(None)));
        }
    }

    /// Terminal states reject every transition.
    #[test]
    fn prop_terminal_states_are_final(
        status in prop_oneof![Just(InvoiceStatus::Paid), Just(InvoiceStatus::Void)],
        due in arb_date(),
        today in arb_date(),
    ) {
        prop_assert!(InvoiceStateMachine::issue(status, None, InvoiceNumber::generate(today)).is_err());
        prop_assert!(InvoiceStateMachine::mark_paid(status).is_err());
        prop_assert!(InvoiceStateMachine::void(status, UserId::new(), "r").is_err());
        prop_assert!(!matches!(
            InvoiceStateMachine::mark_overdue(status, due, today),
            Ok(Some(_))
        ));
    }

    /// Only Paid reports AlreadyPaid.
    #[test]
    fn prop_already_paid_only_from_paid(status in arb_status()) {
        let already = matches!(
            InvoiceStateMachine::mark_paid(status),
            Err(InvoiceError::AlreadyPaid)
        );
        prop_assert_eq!(already, status == InvoiceStatus::Paid);
    }
}
