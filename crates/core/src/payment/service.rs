//! Payment reconciliation rules.
//!
//! The reconciler decides what a submission, confirmation or failure does.
//! Repositories load rows under lock, call into here, and persist the
//! returned plan in the same transaction.

use chrono::Utc;

use rentflow_shared::types::{Currency, UserId};

use crate::invoice::{InvoiceSnapshot, InvoiceStateMachine, InvoiceStatus};
use crate::ledger::LedgerService;
use crate::payment::error::PaymentError;
use crate::payment::types::{
    ConfirmationEffects, ConfirmationPlan, ConfirmationSource, FailurePlan, NewReceipt,
    PaymentSnapshot, PaymentStatus, SubmitPaymentInput,
};

/// Longest accepted payment reference.
pub const MAX_REFERENCE_LEN: usize = 255;

/// Stateless service for payment reconciliation.
pub struct PaymentReconciler;

impl PaymentReconciler {
    /// Validates a submission against the invoice it pays.
    ///
    /// Checks run in order: payer, currency, invoice status, amount,
    /// reference. Returns the trimmed reference.
    pub fn validate_submission(
        invoice: &InvoiceSnapshot,
        input: &SubmitPaymentInput,
    ) -> Result<String, PaymentError> {
        if input.payer_id != invoice.tenant_id {
            return Err(PaymentError::Forbidden {
                payer_id: input.payer_id,
                invoice_id: invoice.id,
            });
        }
        Self::check_currency(invoice, input.amount.currency)?;
        Self::check_payable(invoice)?;

        if !input.amount.is_positive() {
            return Err(PaymentError::InvalidAmount(input.amount.amount_minor));
        }
        if input.amount.amount_minor != invoice.amount.amount_minor {
            return Err(PaymentError::AmountMismatch {
                expected: invoice.amount.amount_minor,
                actual: input.amount.amount_minor,
            });
        }

        Self::validate_reference(&input.reference)
    }

    /// Validates and trims a payment reference.
    pub fn validate_reference(reference: &str) -> Result<String, PaymentError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(PaymentError::ReferenceRequired);
        }
        let len = reference.chars().count();
        if len > MAX_REFERENCE_LEN {
            return Err(PaymentError::ReferenceTooLong {
                max: MAX_REFERENCE_LEN,
                actual: len,
            });
        }
        Ok(reference.to_string())
    }

    /// Plans the confirmation of `payment` against its locked invoice.
    ///
    /// # Returns
    /// * `Ok(ConfirmationPlan::AlreadyConfirmed)` if the payment is confirmed
    /// * `Ok(ConfirmationPlan::AlreadyPaid)` if another payment settled the invoice
    /// * `Ok(ConfirmationPlan::Apply)` with every write to perform
    /// * `Err(PaymentError::NotSubmitted)` for failed payments
    pub fn plan_confirmation(
        payment: &PaymentSnapshot,
        invoice: &InvoiceSnapshot,
        source: ConfirmationSource,
        confirmed_by: Option<UserId>,
    ) -> Result<ConfirmationPlan, PaymentError> {
        if payment.invoice_id != invoice.id {
            return Err(PaymentError::InvoiceNotFound(payment.invoice_id));
        }
        match payment.status {
            PaymentStatus::Confirmed => return Ok(ConfirmationPlan::AlreadyConfirmed),
            PaymentStatus::Failed => {
                return Err(PaymentError::NotSubmitted {
                    status: payment.status,
                });
            }
            PaymentStatus::Submitted => {}
        }
        if invoice.status == InvoiceStatus::Paid {
            return Ok(ConfirmationPlan::AlreadyPaid);
        }
        Self::check_currency(invoice, payment.amount.currency)?;
        Self::check_payable(invoice)?;

        let invoice_action = InvoiceStateMachine::mark_paid(invoice.status)?;
        let memo = invoice
            .number
            .as_ref()
            .map(|number| format!("Payment for invoice {number}"));
        let credit =
            LedgerService::credit_for_payment(invoice.landlord_id, payment.id, payment.amount, memo)?;
        let confirmed_at = Utc::now();

        Ok(ConfirmationPlan::Apply(Box::new(ConfirmationEffects {
            confirmed_at,
            confirmed_by,
            source,
            invoice_action,
            receipt: NewReceipt {
                payment_id: payment.id,
                invoice_id: invoice.id,
                amount: payment.amount,
                issued_at: confirmed_at,
            },
            credit,
        })))
    }

    /// Plans marking a payment failed.
    ///
    /// # Returns
    /// * `Ok(FailurePlan::Apply)` for a submitted payment
    /// * `Ok(FailurePlan::AlreadyFailed)` if it already failed
    /// * `Err(PaymentError::InvalidTransition)` for confirmed payments
    pub fn plan_failure(status: PaymentStatus, reason: &str) -> Result<FailurePlan, PaymentError> {
        match status {
            PaymentStatus::Failed => Ok(FailurePlan::AlreadyFailed),
            PaymentStatus::Confirmed => Err(PaymentError::InvalidTransition {
                from: status,
                to: PaymentStatus::Failed,
            }),
            PaymentStatus::Submitted => {
                let reason = reason.trim();
                if reason.is_empty() {
                    return Err(PaymentError::FailureReasonRequired);
                }
                Ok(FailurePlan::Apply {
                    failed_at: Utc::now(),
                    reason: reason.to_string(),
                })
            }
        }
    }

    fn check_currency(invoice: &InvoiceSnapshot, currency: Currency) -> Result<(), PaymentError> {
        if currency == invoice.amount.currency {
            Ok(())
        } else {
            Err(PaymentError::CurrencyMismatch {
                invoice: invoice.amount.currency,
                payment: currency,
            })
        }
    }

    fn check_payable(invoice: &InvoiceSnapshot) -> Result<(), PaymentError> {
        match invoice.status {
            InvoiceStatus::Paid => Err(PaymentError::AlreadyPaid(invoice.id)),
            status if status.accepts_payment() => Ok(()),
            status => Err(PaymentError::InvoiceNotPayable { status }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rentflow_shared::types::{InvoiceId, Money, PaymentId};
    use rstest::rstest;

    use crate::ledger::{EntrySource, EntryType};

    fn invoice(status: InvoiceStatus) -> InvoiceSnapshot {
        InvoiceSnapshot {
            id: InvoiceId::new(),
            landlord_id: UserId::new(),
            tenant_id: UserId::new(),
            amount: Money::new(250_000, Currency::Pkr),
            status,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            number: Some("INV-20260215-ABCDE".into()),
        }
    }

    fn submission(invoice: &InvoiceSnapshot) -> SubmitPaymentInput {
        SubmitPaymentInput {
            invoice_id: invoice.id,
            payer_id: invoice.tenant_id,
            amount: invoice.amount,
            reference: "  HBL-123456 ".into(),
        }
    }

    fn payment(invoice: &InvoiceSnapshot, status: PaymentStatus) -> PaymentSnapshot {
        PaymentSnapshot {
            id: PaymentId::new(),
            invoice_id: invoice.id,
            payer_id: invoice.tenant_id,
            amount: invoice.amount,
            status,
        }
    }

    #[rstest]
    #[case(InvoiceStatus::Issued)]
    #[case(InvoiceStatus::Overdue)]
    fn test_valid_submission(#[case] status: InvoiceStatus) {
        let inv = invoice(status);
        let reference = PaymentReconciler::validate_submission(&inv, &submission(&inv)).unwrap();
        assert_eq!(reference, "HBL-123456");
    }

    #[test]
    fn test_submission_by_other_user_is_forbidden() {
        let inv = invoice(InvoiceStatus::Issued);
        let mut input = submission(&inv);
        input.payer_id = inv.landlord_id;
        assert!(matches!(
            PaymentReconciler::validate_submission(&inv, &input),
            Err(PaymentError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_currency_checked_before_status() {
        let inv = invoice(InvoiceStatus::Paid);
        let mut input = submission(&inv);
        input.amount = Money::new(250_000, Currency::Usd);
        assert!(matches!(
            PaymentReconciler::validate_submission(&inv, &input),
            Err(PaymentError::CurrencyMismatch {
                invoice: Currency::Pkr,
                payment: Currency::Usd
            })
        ));
    }

    #[rstest]
    #[case(InvoiceStatus::Paid, "ALREADY_PAID")]
    #[case(InvoiceStatus::Draft, "INVOICE_NOT_PAYABLE")]
    #[case(InvoiceStatus::Void, "INVOICE_NOT_PAYABLE")]
    fn test_submission_requires_payable_invoice(
        #[case] status: InvoiceStatus,
        #[case] code: &str,
    ) {
        let inv = invoice(status);
        let err = PaymentReconciler::validate_submission(&inv, &submission(&inv)).unwrap_err();
        assert_eq!(err.error_code(), code);
        assert_eq!(err.status_code(), 409);
    }

    #[rstest]
    #[case(0, "INVALID_AMOUNT")]
    #[case(-5, "INVALID_AMOUNT")]
    #[case(100_000, "AMOUNT_MISMATCH")]
    fn test_submission_amount(#[case] amount: i64, #[case] code: &str) {
        let inv = invoice(InvoiceStatus::Issued);
        let mut input = submission(&inv);
        input.amount = Money::new(amount, Currency::Pkr);
        let err = PaymentReconciler::validate_submission(&inv, &input).unwrap_err();
        assert_eq!(err.error_code(), code);
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_reference_validation() {
        assert!(matches!(
            PaymentReconciler::validate_reference("   "),
            Err(PaymentError::ReferenceRequired)
        ));
        let long = "x".repeat(MAX_REFERENCE_LEN + 1);
        assert!(matches!(
            PaymentReconciler::validate_reference(&long),
            Err(PaymentError::ReferenceTooLong { actual, .. }) if actual == MAX_REFERENCE_LEN + 1
        ));
        let max = "x".repeat(MAX_REFERENCE_LEN);
        assert!(PaymentReconciler::validate_reference(&max).is_ok());
    }

    #[test]
    fn test_plan_confirmation_effects() {
        let inv = invoice(InvoiceStatus::Overdue);
        let pay = payment(&inv, PaymentStatus::Submitted);
        let staff = UserId::new();
        let plan = PaymentReconciler::plan_confirmation(
            &pay,
            &inv,
            ConfirmationSource::Staff,
            Some(staff),
        )
        .unwrap();

        let ConfirmationPlan::Apply(effects) = plan else {
            panic!("expected effects");
        };
        assert_eq!(effects.confirmed_by, Some(staff));
        assert_eq!(effects.invoice_action.new_status(), InvoiceStatus::Paid);
        assert_eq!(effects.receipt.payment_id, pay.id);
        assert_eq!(effects.receipt.invoice_id, inv.id);
        assert_eq!(effects.receipt.amount, pay.amount);
        assert_eq!(effects.credit.entry_type, EntryType::Credit);
        assert_eq!(effects.credit.source, EntrySource::Payment);
        assert_eq!(effects.credit.payment_id, Some(pay.id));
        assert_eq!(effects.credit.landlord_id, inv.landlord_id);
        assert_eq!(effects.credit.amount, pay.amount);
        assert_eq!(
            effects.credit.memo.as_deref(),
            Some("Payment for invoice INV-20260215-ABCDE")
        );
    }

    #[test]
    fn test_plan_confirmation_is_idempotent() {
        let inv = invoice(InvoiceStatus::Paid);
        let pay = payment(&inv, PaymentStatus::Confirmed);
        let plan =
            PaymentReconciler::plan_confirmation(&pay, &inv, ConfirmationSource::Staff, None)
                .unwrap();
        assert_eq!(plan, ConfirmationPlan::AlreadyConfirmed);
        assert!(!plan.is_applied());
    }

    #[test]
    fn test_second_payment_on_paid_invoice() {
        let inv = invoice(InvoiceStatus::Paid);
        let pay = payment(&inv, PaymentStatus::Submitted);
        let plan = PaymentReconciler::plan_confirmation(
            &pay,
            &inv,
            ConfirmationSource::Provider("stripe".into()),
            None,
        )
        .unwrap();
        assert_eq!(plan, ConfirmationPlan::AlreadyPaid);
    }

    #[test]
    fn test_failed_payment_cannot_be_confirmed() {
        let inv = invoice(InvoiceStatus::Issued);
        let pay = payment(&inv, PaymentStatus::Failed);
        assert!(matches!(
            PaymentReconciler::plan_confirmation(&pay, &inv, ConfirmationSource::Staff, None),
            Err(PaymentError::NotSubmitted {
                status: PaymentStatus::Failed
            })
        ));
    }

    #[test]
    fn test_confirmation_against_void_invoice() {
        let inv = invoice(InvoiceStatus::Void);
        let pay = payment(&inv, PaymentStatus::Submitted);
        assert!(matches!(
            PaymentReconciler::plan_confirmation(&pay, &inv, ConfirmationSource::Staff, None),
            Err(PaymentError::InvoiceNotPayable {
                status: InvoiceStatus::Void
            })
        ));
    }

    #[test]
    fn test_plan_failure() {
        assert!(matches!(
            PaymentReconciler::plan_failure(PaymentStatus::Submitted, " card declined "),
            Ok(FailurePlan::Apply { reason, .. }) if reason == "card declined"
        ));
        assert_eq!(
            PaymentReconciler::plan_failure(PaymentStatus::Failed, "again").unwrap(),
            FailurePlan::AlreadyFailed
        );
        assert!(matches!(
            PaymentReconciler::plan_failure(PaymentStatus::Confirmed, "late"),
            Err(PaymentError::InvalidTransition { .. })
        ));
        assert!(matches!(
            PaymentReconciler::plan_failure(PaymentStatus::Submitted, ""),
            Err(PaymentError::FailureReasonRequired)
        ));
    }
}
