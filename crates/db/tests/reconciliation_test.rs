//! Payment reconciliation integration tests.

mod common;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use common::{date, issued_invoice, pkr, seed_parties, setup_db, submit_full_payment};
use rentflow_core::ledger::LedgerService;
use rentflow_core::payment::{PaymentError, SubmitPaymentInput};
use rentflow_db::entities::sea_orm_active_enums::{
    EntrySource, EntryType, InvoiceStatus, PaymentStatus,
};
use rentflow_db::entities::{invoices, ledger_entries, payments, receipts};
use rentflow_db::{ConfirmOutcome, InvoiceRepository, LedgerRepository, ReconciliationRepository};
use rentflow_shared::types::{Currency, Money, PaymentId, ReceiptId};

async fn count_receipts(db: &DatabaseConnection) -> u64 {
    receipts::Entity::find().count(db).await.unwrap()
}

async fn count_entries(db: &DatabaseConnection) -> u64 {
    ledger_entries::Entity::find().count(db).await.unwrap()
}

#[tokio::test]
async fn test_confirm_applies_all_effects_once() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(250_000), date(2026, 3, 10)).await;
    let payment = submit_full_payment(&db, &parties, &invoice, "HBL-TRX-1001").await;
    assert_eq!(payment.status, PaymentStatus::Submitted);

    let repo = ReconciliationRepository::new(db.clone());
    let outcome = repo
        .confirm_payment(&parties.staff, payment.id.into())
        .await
        .unwrap();

    let (confirmed, paid, receipt, entry) = match outcome {
        ConfirmOutcome::Applied {
            payment,
            invoice,
            receipt,
            entry,
        } => (payment, invoice, receipt, entry),
        other => panic!("expected the first confirm to apply, got {other:?}"),
    };
    assert_eq!(confirmed.status, PaymentStatus::Confirmed);
    assert_eq!(confirmed.confirmed_by, Some(parties.staff.id.into_inner()));
    assert_eq!(confirmed.confirmation_source.as_deref(), Some("staff"));
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert!(paid.paid_at.is_some());
    assert_eq!(receipt.payment_id, payment.id);
    assert_eq!(receipt.amount_minor, 250_000);
    assert_eq!(entry.entry_type, EntryType::Credit);
    assert_eq!(entry.source, EntrySource::Payment);
    assert_eq!(entry.payment_id, Some(payment.id));
    assert_eq!(entry.account_version, 1);
    assert_eq!(entry.current_balance_minor, 250_000);

    let again = repo
        .confirm_payment(&parties.staff, payment.id.into())
        .await
        .unwrap();
    assert!(matches!(again, ConfirmOutcome::AlreadyConfirmed { .. }));

    assert_eq!(count_receipts(&db).await, 1);
    assert_eq!(count_entries(&db).await, 1);
    let balance = LedgerRepository::new(db.clone())
        .balance(parties.landlord.id, Currency::Pkr)
        .await
        .unwrap();
    assert_eq!(balance.balance, 250_000);
}

#[tokio::test]
async fn test_currency_mismatch_creates_no_payment() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(250_000), date(2026, 3, 10)).await;

    let err = ReconciliationRepository::new(db.clone())
        .submit_payment(
            &parties.tenant,
            SubmitPaymentInput {
                invoice_id: invoice.id.into(),
                payer_id: parties.tenant.id,
                amount: Money::new(250_000, Currency::Usd),
                reference: "WIRE-77".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PaymentError::CurrencyMismatch {
            invoice: Currency::Pkr,
            payment: Currency::Usd
        }
    ));
    assert_eq!(payments::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_submit_validation() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(250_000), date(2026, 3, 10)).await;
    let repo = ReconciliationRepository::new(db.clone());

    let input = |amount: i64, reference: &str| SubmitPaymentInput {
        invoice_id: invoice.id.into(),
        payer_id: parties.tenant.id,
        amount: pkr(amount),
        reference: reference.to_string(),
    };

    assert!(matches!(
        repo.submit_payment(&parties.tenant, input(100_000, "REF")).await,
        Err(PaymentError::AmountMismatch {
            expected: 250_000,
            actual: 100_000
        })
    ));
    assert!(matches!(
        repo.submit_payment(&parties.tenant, input(0, "REF")).await,
        Err(PaymentError::InvalidAmount(0))
    ));
    assert!(matches!(
        repo.submit_payment(&parties.tenant, input(250_000, "  ")).await,
        Err(PaymentError::ReferenceRequired)
    ));
    // Someone else cannot pay on the tenant's behalf.
    assert!(matches!(
        repo.submit_payment(&parties.landlord, input(250_000, "REF")).await,
        Err(PaymentError::Forbidden { .. })
    ));

    let stored = repo
        .submit_payment(&parties.tenant, input(250_000, "  HBL-9  "))
        .await
        .unwrap();
    assert_eq!(stored.reference, "HBL-9");
}

#[tokio::test]
async fn test_draft_and_paid_invoices_reject_payments() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let repo = ReconciliationRepository::new(db.clone());

    let draft = InvoiceRepository::new(db.clone())
        .create_draft(
            &parties.landlord,
            rentflow_core::invoice::NewInvoice {
                landlord_id: parties.landlord.id,
                tenant_id: parties.tenant.id,
                amount: pkr(1_000),
                due_date: date(2026, 4, 1),
                description: None,
            },
        )
        .await
        .unwrap();
    let err = repo
        .submit_payment(
            &parties.tenant,
            SubmitPaymentInput {
                invoice_id: draft.id.into(),
                payer_id: parties.tenant.id,
                amount: pkr(1_000),
                reference: "REF".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::InvoiceNotPayable { .. }));

    let invoice = issued_invoice(&db, &parties, pkr(5_000), date(2026, 3, 10)).await;
    let payment = submit_full_payment(&db, &parties, &invoice, "A").await;
    repo.confirm_payment(&parties.staff, payment.id.into())
        .await
        .unwrap();

    let err = repo
        .submit_payment(
            &parties.tenant,
            SubmitPaymentInput {
                invoice_id: invoice.id.into(),
                payer_id: parties.tenant.id,
                amount: pkr(5_000),
                reference: "B".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::AlreadyPaid(_)));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn test_second_payment_on_paid_invoice_is_a_no_op() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(80_000), date(2026, 3, 10)).await;
    let first = submit_full_payment(&db, &parties, &invoice, "FIRST").await;
    let second = submit_full_payment(&db, &parties, &invoice, "SECOND").await;
    let repo = ReconciliationRepository::new(db.clone());

    repo.confirm_payment(&parties.staff, first.id.into())
        .await
        .unwrap();
    let outcome = repo
        .confirm_payment(&parties.staff, second.id.into())
        .await
        .unwrap();

    assert!(matches!(outcome, ConfirmOutcome::AlreadyPaid { .. }));
    assert_eq!(outcome.label(), "already_paid");
    let second = payments::Entity::find_by_id(second.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.status, PaymentStatus::Submitted);
    assert_eq!(count_receipts(&db).await, 1);
    assert_eq!(count_entries(&db).await, 1);
}

#[tokio::test]
async fn test_confirm_settles_overdue_invoice() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(60_000), date(2026, 3, 1)).await;
    rentflow_db::OverdueRepository::new(db.clone())
        .sweep_overdue(date(2026, 3, 15))
        .await
        .unwrap();
    let payment = submit_full_payment(&db, &parties, &invoice, "LATE").await;

    let outcome = ReconciliationRepository::new(db.clone())
        .confirm_payment(&parties.staff, payment.id.into())
        .await
        .unwrap();
    assert!(outcome.is_applied());

    let invoice = invoices::Entity::find_by_id(invoice.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn test_fail_payment_paths() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(10_000), date(2026, 3, 10)).await;
    let bounced = submit_full_payment(&db, &parties, &invoice, "BOUNCE").await;
    let good = submit_full_payment(&db, &parties, &invoice, "GOOD").await;
    let repo = ReconciliationRepository::new(db.clone());

    assert!(matches!(
        repo.fail_payment(&parties.staff, bounced.id.into(), " ").await,
        Err(PaymentError::FailureReasonRequired)
    ));
    assert!(matches!(
        repo.fail_payment(&parties.tenant, bounced.id.into(), "nope").await,
        Err(PaymentError::Access(_))
    ));

    let failed = repo
        .fail_payment(&parties.staff, bounced.id.into(), "Cheque bounced")
        .await
        .unwrap();
    assert!(failed.applied);
    assert_eq!(failed.payment.status, PaymentStatus::Failed);
    assert_eq!(failed.payment.failure_reason.as_deref(), Some("Cheque bounced"));

    let again = repo
        .fail_payment(&parties.staff, bounced.id.into(), "Cheque bounced")
        .await
        .unwrap();
    assert!(!again.applied);

    assert!(matches!(
        repo.confirm_payment(&parties.staff, bounced.id.into()).await,
        Err(PaymentError::NotSubmitted { .. })
    ));

    repo.confirm_payment(&parties.staff, good.id.into())
        .await
        .unwrap();
    assert!(matches!(
        repo.fail_payment(&parties.staff, good.id.into(), "late").await,
        Err(PaymentError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_only_staff_confirm_and_unknown_payment() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(10_000), date(2026, 3, 10)).await;
    let payment = submit_full_payment(&db, &parties, &invoice, "X").await;
    let repo = ReconciliationRepository::new(db.clone());

    let err = repo
        .confirm_payment(&parties.landlord, payment.id.into())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    let err = repo
        .confirm_payment(&parties.staff, PaymentId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::PaymentNotFound(_)));
}

#[tokio::test]
async fn test_payment_details_visibility() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let outsider = common::create_user(&db, rentflow_core::access::Role::Landlord).await;
    let invoice = issued_invoice(&db, &parties, pkr(10_000), date(2026, 3, 10)).await;
    let payment = submit_full_payment(&db, &parties, &invoice, "X").await;
    let repo = ReconciliationRepository::new(db.clone());

    let details = repo
        .find_details(&parties.tenant, payment.id.into())
        .await
        .unwrap();
    assert!(details.receipt.is_none());

    repo.confirm_payment(&parties.staff, payment.id.into())
        .await
        .unwrap();
    let details = repo
        .find_details(&parties.landlord, payment.id.into())
        .await
        .unwrap();
    assert_eq!(
        details.receipt.map(|r| r.invoice_id),
        Some(invoice.id)
    );

    assert!(matches!(
        repo.find_details(&outsider, payment.id.into()).await,
        Err(PaymentError::PaymentNotFound(_))
    ));
}

#[tokio::test]
async fn test_receipts_are_unique_per_invoice() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(10_000), date(2026, 3, 10)).await;
    let payment = submit_full_payment(&db, &parties, &invoice, "X").await;
    ReconciliationRepository::new(db.clone())
        .confirm_payment(&parties.staff, payment.id.into())
        .await
        .unwrap();

    let count = receipts::Entity::find()
        .filter(receipts::Column::InvoiceId.eq(invoice.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

async fn assert_still_unsettled(db: &DatabaseConnection, payment: &payments::Model) {
    let payment = payments::Entity::find_by_id(payment.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Submitted);
    assert!(payment.confirmed_at.is_none());

    let invoice = invoices::Entity::find_by_id(payment.invoice_id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Issued);
    assert!(invoice.paid_at.is_none());
}

#[tokio::test]
async fn test_failed_ledger_append_rolls_back_confirmation() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(250_000), date(2026, 3, 10)).await;
    let payment = submit_full_payment(&db, &parties, &invoice, "DUP-LEDGER").await;

    // A credit already referencing the payment makes the final step collide.
    let planted = LedgerService::credit_for_payment(
        parties.landlord.id,
        payment.id.into(),
        pkr(250_000),
        Some("planted".to_string()),
    )
    .unwrap();
    LedgerRepository::append_entry_in(&db, &planted)
        .await
        .unwrap();

    let err = ReconciliationRepository::new(db.clone())
        .confirm_payment(&parties.staff, payment.id.into())
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Ledger(_)), "got {err:?}");

    assert_still_unsettled(&db, &payment).await;
    assert_eq!(count_receipts(&db).await, 0);
    assert_eq!(count_entries(&db).await, 1);
}

#[tokio::test]
async fn test_receipt_conflict_rolls_back_confirmation() {
    let db = setup_db().await;
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(250_000), date(2026, 3, 10)).await;
    let payment = submit_full_payment(&db, &parties, &invoice, "DUP-RECEIPT").await;

    let now = Utc::now();
    receipts::ActiveModel {
        id: Set(ReceiptId::new().into_inner()),
        payment_id: Set(payment.id),
        invoice_id: Set(invoice.id),
        amount_minor: Set(invoice.amount_minor),
        currency: Set(invoice.currency.clone()),
        issued_at: Set(now.into()),
        created_at: Set(now.into()),
    }
    .insert(&db)
    .await
    .unwrap();

    // The unique key trips, and the payment is not confirmed by anyone else,
    // so the conflict surfaces as an error instead of a no-op.
    let err = ReconciliationRepository::new(db.clone())
        .confirm_payment(&parties.staff, payment.id.into())
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Database(_)), "got {err:?}");

    assert_still_unsettled(&db, &payment).await;
    assert_eq!(count_receipts(&db).await, 1);
    assert_eq!(count_entries(&db).await, 0);
}
