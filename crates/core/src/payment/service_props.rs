//! Property-based tests for payment reconciliation.

use chrono::NaiveDate;
use proptest::prelude::*;

use rentflow_shared::types::{Currency, InvoiceId, Money, PaymentId, UserId};

use crate::invoice::{InvoiceSnapshot, InvoiceStatus};
use crate::payment::service::PaymentReconciler;
use crate::payment::types::{
    ConfirmationPlan, ConfirmationSource, PaymentSnapshot, PaymentStatus, SubmitPaymentInput,
};

fn arb_invoice_status() -> impl Strategy<Value = InvoiceStatus> {
    prop_oneof![
        Just(InvoiceStatus::Draft),
        Just(InvoiceStatus::Issued),
        Just(InvoiceStatus::Paid),
        Just(InvoiceStatus::Overdue),
        Just(InvoiceStatus::Void),
    ]
}

fn arb_payment_status() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Submitted),
        Just(PaymentStatus::Confirmed),
        Just(PaymentStatus::Failed),
    ]
}

fn arb_currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

fn invoice(status: InvoiceStatus, amount: i64, currency: Currency) -> InvoiceSnapshot {
    InvoiceSnapshot {
        id: InvoiceId::new(),
        landlord_id: UserId::new(),
        tenant_id: UserId::new(),
        amount: Money::new(amount, currency),
        status,
        due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        number: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A submission in another currency is always rejected.
    #[test]
    fn prop_currency_mismatch_never_validates(
        status in arb_invoice_status(),
        amount in 1i64..10_000_000,
        invoice_currency in arb_currency(),
        payment_currency in arb_currency(),
    ) {
        prop_assume!(invoice_currency != payment_currency);
        let inv = invoice(status, amount, invoice_currency);
        let input = SubmitPaymentInput {
            invoice_id: inv.id,
            payer_id: inv.tenant_id,
            amount: Money::new(amount, payment_currency),
            reference: "ref".into(),
        };
        prop_assert_eq!(
            PaymentReconciler::validate_submission(&inv, &input).unwrap_err().error_code(),
            "CURRENCY_MISMATCH"
        );
    }

    /// Applied confirmations credit exactly the payment amount and receipt it.
    #[test]
    fn prop_confirmation_conserves_amount(
        invoice_status in arb_invoice_status(),
        payment_status in arb_payment_status(),
        amount in 1i64..10_000_000,
        currency in arb_currency(),
    ) {
        let inv = invoice(invoice_status, amount, currency);
        let pay = PaymentSnapshot {
            id: PaymentId::new(),
            invoice_id: inv.id,
            payer_id: inv.tenant_id,
            amount: inv.amount,
            status: payment_status,
        };
        match PaymentReconciler::plan_confirmation(&pay, &inv, ConfirmationSource::Staff, None) {
            Ok(ConfirmationPlan::Apply(effects)) => {
                prop_assert_eq!(payment_status, PaymentStatus::Submitted);
                prop_assert!(invoice_status.accepts_payment());
                prop_assert_eq!(effects.credit.amount, pay.amount);
                prop_assert_eq!(effects.receipt.amount, pay.amount);
                prop_assert_eq!(effects.credit.signed_amount(), amount);
            }
            Ok(ConfirmationPlan::AlreadyConfirmed) => {
                prop_assert_eq!(payment_status, PaymentStatus::Confirmed);
            }
            Ok(ConfirmationPlan::AlreadyPaid) => {
                prop_assert_eq!(invoice_status, InvoiceStatus::Paid);
            }
            Err(_) => {
                prop_assert!(
                    payment_status == PaymentStatus::Failed || !invoice_status.accepts_payment()
                );
            }
        }
    }
}
