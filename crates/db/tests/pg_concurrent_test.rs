//! Concurrency against Postgres.
//!
//! Each test releases its callers together through a barrier on a
//! multi-threaded runtime, so confirmations and approvals really contend
//! for `FOR UPDATE` row locks across separate pool connections.

#![allow(clippy::items_after_statements)]

mod common;

use std::sync::Arc;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tokio::sync::Barrier;

use common::postgres::setup_pg;
use common::{date, issued_invoice, pkr, seed_parties, submit_full_payment};
use rentflow_core::payout::{PayoutDecision, PayoutError};
use rentflow_db::entities::sea_orm_active_enums::{InvoiceStatus, PaymentStatus};
use rentflow_db::entities::{invoices, ledger_entries, payments, receipts};
use rentflow_db::{ConfirmOutcome, LedgerRepository, PayoutRepository, ReconciliationRepository};
use rentflow_shared::types::{Currency, PageRequest, PaymentId, PayoutId};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pg_racing_confirms_apply_once() {
    let Some(pg) = setup_pg().await else { return };
    let db = pg.db.clone();
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(250_000), date(2026, 3, 10)).await;
    let payment = submit_full_payment(&db, &parties, &invoice, "PG-RACE").await;
    let payment_id: PaymentId = payment.id.into();

    const CALLERS: usize = 16;
    let barrier = Arc::new(Barrier::new(CALLERS));
    let mut handles = Vec::with_capacity(CALLERS);
    for _ in 0..CALLERS {
        let repo = ReconciliationRepository::new(db.clone());
        let staff = parties.staff;
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            repo.confirm_payment(&staff, payment_id).await
        }));
    }

    let mut applied = 0;
    let mut already = 0;
    for handle in handles {
        match handle.await.unwrap().expect("every confirm succeeds") {
            ConfirmOutcome::Applied { .. } => applied += 1,
            ConfirmOutcome::AlreadyConfirmed { .. } => already += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(applied, 1);
    assert_eq!(already, CALLERS - 1);

    let receipt_count = receipts::Entity::find()
        .filter(receipts::Column::PaymentId.eq(payment.id))
        .count(&db)
        .await
        .unwrap();
    let entry_count = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::PaymentId.eq(payment.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(receipt_count, 1);
    assert_eq!(entry_count, 1);

    let balance = LedgerRepository::new(db.clone())
        .balance(parties.landlord.id, Currency::Pkr)
        .await
        .unwrap();
    assert_eq!(balance.balance, 250_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pg_second_payment_for_same_invoice_is_already_paid() {
    let Some(pg) = setup_pg().await else { return };
    let db = pg.db.clone();
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(120_000), date(2026, 3, 10)).await;
    let first = submit_full_payment(&db, &parties, &invoice, "PG-A").await;
    let second = submit_full_payment(&db, &parties, &invoice, "PG-B").await;

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [first.id, second.id]
        .into_iter()
        .map(|id| {
            let repo = ReconciliationRepository::new(db.clone());
            let staff = parties.staff;
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                repo.confirm_payment(&staff, PaymentId::from(id)).await
            })
        })
        .collect();

    let mut applied = Vec::new();
    let mut already_paid = Vec::new();
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            ConfirmOutcome::Applied { payment, .. } => applied.push(payment.id),
            ConfirmOutcome::AlreadyPaid { payment } => already_paid.push(payment.id),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(applied.len(), 1);
    assert_eq!(already_paid.len(), 1);

    let loser = payments::Entity::find_by_id(already_paid[0])
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loser.status, PaymentStatus::Submitted);

    let stored = invoices::Entity::find_by_id(invoice.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, InvoiceStatus::Paid);

    let receipt_count = receipts::Entity::find()
        .filter(receipts::Column::InvoiceId.eq(invoice.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(receipt_count, 1);
    let balance = LedgerRepository::new(db.clone())
        .balance(parties.landlord.id, Currency::Pkr)
        .await
        .unwrap();
    assert_eq!(balance.balance, 120_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pg_competing_approvals_cannot_overdraw() {
    let Some(pg) = setup_pg().await else { return };
    let db = pg.db.clone();
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(250_000), date(2026, 3, 10)).await;
    let payment = submit_full_payment(&db, &parties, &invoice, "PG-FUNDS").await;
    ReconciliationRepository::new(db.clone())
        .confirm_payment(&parties.staff, payment.id.into())
        .await
        .unwrap();

    let payouts = PayoutRepository::new(db.clone());
    let mut ids: Vec<PayoutId> = Vec::new();
    for _ in 0..4 {
        let payout = payouts
            .request_payout(&parties.landlord, Some(100_000), Currency::Pkr, None)
            .await
            .unwrap();
        ids.push(payout.id.into());
    }

    let barrier = Arc::new(Barrier::new(ids.len()));
    let handles: Vec<_> = ids
        .iter()
        .map(|id| {
            let repo = payouts.clone();
            let staff = parties.staff;
            let barrier = Arc::clone(&barrier);
            let id = *id;
            tokio::spawn(async move {
                barrier.wait().await;
                repo.decide(&staff, id, PayoutDecision::Approve, None).await
            })
        })
        .collect();

    let mut approved = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                assert!(outcome.applied);
                approved += 1;
            }
            Err(PayoutError::InsufficientBalance {
                available: 50_000,
                requested: 100_000,
            }) => short += 1,
            Err(e) => panic!("unexpected error {e:?}"),
        }
    }
    assert_eq!(approved, 2);
    assert_eq!(short, 2);

    let balance = LedgerRepository::new(db.clone())
        .balance(parties.landlord.id, Currency::Pkr)
        .await
        .unwrap();
    assert_eq!(balance.balance, 50_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pg_parallel_credits_keep_running_balance_chained() {
    let Some(pg) = setup_pg().await else { return };
    let db = pg.db.clone();
    let parties = seed_parties(&db).await;

    let mut payment_ids = Vec::new();
    let mut expected_total = 0;
    for day in 1..=10 {
        let amount = 1_000 * i64::from(day);
        expected_total += amount;
        let invoice = issued_invoice(&db, &parties, pkr(amount), date(2026, 4, day)).await;
        let payment = submit_full_payment(&db, &parties, &invoice, &format!("PG-{day}")).await;
        payment_ids.push(PaymentId::from(payment.id));
    }

    let barrier = Arc::new(Barrier::new(payment_ids.len()));
    let handles: Vec<_> = payment_ids
        .iter()
        .map(|id| {
            let repo = ReconciliationRepository::new(db.clone());
            let staff = parties.staff;
            let barrier = Arc::clone(&barrier);
            let id = *id;
            tokio::spawn(async move {
                barrier.wait().await;
                repo.confirm_payment(&staff, id).await
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_applied());
    }

    let page = LedgerRepository::new(db.clone())
        .entries(
            parties.landlord.id,
            Some(Currency::Pkr),
            PageRequest {
                page: 1,
                per_page: 100,
            },
        )
        .await
        .unwrap();
    let mut entries = page.data;
    entries.sort_by_key(|e| e.account_version);
    let versions: Vec<i64> = entries.iter().map(|e| e.account_version).collect();
    assert_eq!(versions, (1..=10).collect::<Vec<i64>>());

    let mut previous = 0;
    for entry in &entries {
        assert_eq!(entry.previous_balance_minor, previous);
        assert_eq!(
            entry.current_balance_minor,
            entry.previous_balance_minor + entry.amount_minor
        );
        previous = entry.current_balance_minor;
    }
    assert_eq!(previous, expected_total);
}

#[tokio::test]
async fn test_pg_triggers_reject_ledger_rewrites() {
    let Some(pg) = setup_pg().await else { return };
    let db = pg.db.clone();
    let parties = seed_parties(&db).await;
    let invoice = issued_invoice(&db, &parties, pkr(9_000), date(2026, 3, 10)).await;
    let payment = submit_full_payment(&db, &parties, &invoice, "PG-T").await;
    ReconciliationRepository::new(db.clone())
        .confirm_payment(&parties.staff, payment.id.into())
        .await
        .unwrap();

    let update = ledger_entries::Entity::update_many()
        .col_expr(ledger_entries::Column::AmountMinor, Expr::value(1_i64))
        .filter(ledger_entries::Column::PaymentId.eq(payment.id))
        .exec(&db)
        .await;
    let err = update.expect_err("ledger entries must not be updatable");
    assert!(err.to_string().contains("append-only"), "{err}");

    let delete = receipts::Entity::delete_many()
        .filter(receipts::Column::PaymentId.eq(payment.id))
        .exec(&db)
        .await;
    assert!(delete.is_err());
}
