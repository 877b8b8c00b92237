//! Database seeder for Rentflow development and testing.
//!
//! Seeds a landlord, a tenant and a staff member with fixed ids, plus one
//! issued PKR invoice, then prints a bearer token for each user.
//! Re-running skips whatever already exists.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Days, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use rentflow_core::access::{Actor, Role};
use rentflow_core::invoice::NewInvoice;
use rentflow_db::{InvoiceFilter, InvoiceRepository, UserRepository, connect};
use rentflow_shared::types::{Currency, Money, PageRequest, UserId};
use rentflow_shared::{AppConfig, JwtService};

/// Demo landlord ID (consistent for all seeds)
const LANDLORD_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);
/// Demo tenant ID (consistent for all seeds)
const TENANT_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);
/// Demo staff ID (consistent for all seeds)
const STAFF_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0003);

/// Monthly rent for the demo invoice: PKR 2,500.00.
const DEMO_RENT_MINOR: i64 = 250_000;

struct SeedUser {
    id: Uuid,
    email: &'static str,
    full_name: &'static str,
    role: Role,
}

const USERS: [SeedUser; 3] = [
    SeedUser {
        id: LANDLORD_ID,
        email: "landlord@rentflow.dev",
        full_name: "Demo Landlord",
        role: Role::Landlord,
    },
    SeedUser {
        id: TENANT_ID,
        email: "tenant@rentflow.dev",
        full_name: "Demo Tenant",
        role: Role::Tenant,
    },
    SeedUser {
        id: STAFF_ID,
        email: "staff@rentflow.dev",
        full_name: "Demo Staff",
        role: Role::Staff,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding users...");
    seed_users(&db).await?;

    println!("Seeding demo invoice...");
    seed_invoice(&db).await?;

    println!("Issuing bearer tokens...");
    let jwt = JwtService::new(&config.jwt);
    for user in &USERS {
        let token = jwt.issue_token(UserId::from(user.id))?;
        println!("  {:<8} {}  {token}", user.role.as_str(), user.id);
    }

    println!("Seeding complete!");
    Ok(())
}

/// Seeds the demo users, skipping ones that exist.
async fn seed_users(db: &DatabaseConnection) -> anyhow::Result<()> {
    let repo = UserRepository::new(db.clone());
    for user in &USERS {
        if repo.find_by_id(user.id.into()).await?.is_some() {
            println!("  {} already exists, skipping...", user.email);
            continue;
        }
        repo.create_with_id(user.id.into(), user.email, user.full_name, user.role)
            .await
            .with_context(|| format!("Failed to create {}", user.email))?;
        println!("  Created {} ({})", user.email, user.role);
    }
    Ok(())
}

/// Seeds one issued invoice from the landlord to the tenant, due in a week.
async fn seed_invoice(db: &DatabaseConnection) -> anyhow::Result<()> {
    let landlord = Actor::new(LANDLORD_ID.into(), Role::Landlord);
    let repo = InvoiceRepository::new(db.clone());

    let existing = repo
        .list(&landlord, InvoiceFilter::default(), PageRequest::default())
        .await?;
    if existing.meta.total > 0 {
        println!("  Landlord already has invoices, skipping...");
        return Ok(());
    }

    let due_date = Utc::now()
        .date_naive()
        .checked_add_days(Days::new(7))
        .context("Due date out of range")?;
    let draft = repo
        .create_draft(
            &landlord,
            NewInvoice {
                landlord_id: landlord.id,
                tenant_id: TENANT_ID.into(),
                amount: Money::new(DEMO_RENT_MINOR, Currency::Pkr),
                due_date,
                description: Some("Demo rent".to_string()),
            },
        )
        .await?;
    let issued = repo.issue(&landlord, draft.id.into()).await?;

    println!(
        "  Issued invoice {} ({}) due {}",
        issued.number.as_deref().unwrap_or("-"),
        issued.id,
        issued.due_date
    );
    Ok(())
}
