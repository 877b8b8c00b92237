//! Shared setup for the database integration suites.
//!
//! Every test gets a private in-memory SQLite database with all migrations
//! applied. The pool holds a single connection so the database lives as
//! long as the pool and concurrent callers queue on it.

#![allow(dead_code)]

pub mod postgres;

use chrono::NaiveDate;
use fake::Fake;
use fake::faker::name::en::Name;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use rentflow_core::access::{Actor, Role};
use rentflow_core::invoice::NewInvoice;
use rentflow_core::payment::SubmitPaymentInput;
use rentflow_db::entities::{invoices, payments};
use rentflow_db::migration::Migrator;
use rentflow_db::{InvoiceRepository, ReconciliationRepository, UserRepository};
use rentflow_shared::types::{Currency, Money, UserId};

/// Opens a fresh migrated in-memory database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    db
}

/// Creates a user with a generated name and unique email.
pub async fn create_user(db: &DatabaseConnection, role: Role) -> Actor {
    let id = UserId::new();
    let name: String = Name().fake();
    let email = format!("{}-{id}@rentflow.test", role.as_str());
    UserRepository::new(db.clone())
        .create_with_id(id, &email, &name, role)
        .await
        .expect("Failed to create user");
    Actor::new(id, role)
}

/// One landlord, one of their tenants and a staff member.
pub struct Parties {
    pub landlord: Actor,
    pub tenant: Actor,
    pub staff: Actor,
}

pub async fn seed_parties(db: &DatabaseConnection) -> Parties {
    Parties {
        landlord: create_user(db, Role::Landlord).await,
        tenant: create_user(db, Role::Tenant).await,
        staff: create_user(db, Role::Staff).await,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn pkr(amount_minor: i64) -> Money {
    Money::new(amount_minor, Currency::Pkr)
}

/// Creates and issues an invoice from the parties' landlord to their tenant.
pub async fn issued_invoice(
    db: &DatabaseConnection,
    parties: &Parties,
    amount: Money,
    due_date: NaiveDate,
) -> invoices::Model {
    let repo = InvoiceRepository::new(db.clone());
    let draft = repo
        .create_draft(
            &parties.landlord,
            NewInvoice {
                landlord_id: parties.landlord.id,
                tenant_id: parties.tenant.id,
                amount,
                due_date,
                description: Some("Rent".to_string()),
            },
        )
        .await
        .expect("Failed to create draft");
    repo.issue(&parties.landlord, draft.id.into())
        .await
        .expect("Failed to issue invoice")
}

/// Submits a payment for the full invoice amount.
pub async fn submit_full_payment(
    db: &DatabaseConnection,
    parties: &Parties,
    invoice: &invoices::Model,
    reference: &str,
) -> payments::Model {
    let currency: Currency = invoice.currency.parse().expect("stored currency");
    ReconciliationRepository::new(db.clone())
        .submit_payment(
            &parties.tenant,
            SubmitPaymentInput {
                invoice_id: invoice.id.into(),
                payer_id: parties.tenant.id,
                amount: Money::new(invoice.amount_minor, currency),
                reference: reference.to_string(),
            },
        )
        .await
        .expect("Failed to submit payment")
}
