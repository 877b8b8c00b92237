//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations (Postgres and SQLite)
//! - Repositories that persist the plans computed by `rentflow-core`
//!
//! Every write that touches more than one row runs in a single
//! transaction and re-reads the rows it depends on under lock.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    ConfirmOutcome, FailOutcome, InvoiceFilter, InvoiceRepository, LedgerRepository,
    OverdueRepository, PaymentDetails, PayoutDecisionOutcome, PayoutFilter, PayoutRepository,
    ProviderEventOutcome, ReconciliationRepository, UserRepository,
};

use std::time::Duration;

use rentflow_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
