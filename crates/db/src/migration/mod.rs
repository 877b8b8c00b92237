//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration. Table DDL is portable
//! between Postgres and SQLite; triggers are written per backend.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_initial;
mod m20260301_000002_append_only;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_initial::Migration),
            Box::new(m20260301_000002_append_only::Migration),
        ]
    }
}
