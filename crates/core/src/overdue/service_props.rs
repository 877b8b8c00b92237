//! Property-based tests for the overdue sweep.

use chrono::NaiveDate;
use proptest::prelude::*;

use rentflow_shared::types::{Currency, InvoiceId, Money, UserId};

use crate::invoice::{InvoiceSnapshot, InvoiceStatus};
use crate::overdue::service::OverdueSweeper;

fn arb_status() -> impl Strategy<Value = InvoiceStatus> {
    prop_oneof![
        Just(InvoiceStatus::Draft),
        Just(InvoiceStatus::Issued),
        Just(InvoiceStatus::Paid),
        Just(InvoiceStatus::Overdue),
        Just(InvoiceStatus::Void),
    ]
}

fn arb_invoice() -> impl Strategy<Value = InvoiceSnapshot> {
    (arb_status(), 0i64..60).prop_map(|(status, offset)| InvoiceSnapshot {
        id: InvoiceId::new(),
        landlord_id: UserId::new(),
        tenant_id: UserId::new(),
        amount: Money::new(100_000, Currency::Pkr),
        status,
        due_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(offset),
        number: None,
    })
}

/// Applies a sweep plan the way the store does.
fn apply(invoices: &mut [InvoiceSnapshot], today: NaiveDate) -> usize {
    let ids = OverdueSweeper::plan(invoices, today);
    for inv in invoices.iter_mut() {
        if ids.contains(&inv.id) {
            inv.status = InvoiceStatus::Overdue;
        }
    }
    ids.len()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A second sweep on the same day changes nothing.
    #[test]
    fn prop_sweep_is_idempotent(
        mut invoices in prop::collection::vec(arb_invoice(), 0..40),
        offset in 0i64..90,
    ) {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(offset);
        apply(&mut invoices, today);
        let snapshot = invoices.clone();
        prop_assert_eq!(apply(&mut invoices, today), 0);
        prop_assert_eq!(invoices, snapshot);
    }

    /// Only issued invoices are ever moved, and paid ones never are.
    #[test]
    fn prop_sweep_only_touches_issued(
        invoices in prop::collection::vec(arb_invoice(), 0..40),
        offset in 0i64..90,
    ) {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(offset);
        let ids = OverdueSweeper::plan(&invoices, today);
        for inv in invoices.iter().filter(|inv| ids.contains(&inv.id)) {
            prop_assert_eq!(inv.status, InvoiceStatus::Issued);
            prop_assert!(inv.due_date < today);
        }
    }
}
