//! Append-only enforcement for ledger entries and receipts.
//!
//! UPDATE and DELETE are rejected by the store itself, even if
//! application code tries.

use sea_orm::DbBackend;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const GUARDED_TABLES: [&str; 2] = ["ledger_entries", "receipts"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        match manager.get_database_backend() {
            DbBackend::Postgres => {
                db.execute_unprepared(POSTGRES_FUNCTION).await?;
                for table in GUARDED_TABLES {
                    db.execute_unprepared(&format!(
                        "CREATE TRIGGER trg_{table}_append_only \
                         BEFORE UPDATE OR DELETE ON {table} \
                         FOR EACH ROW EXECUTE FUNCTION reject_append_only_change()"
                    ))
                    .await?;
                }
            }
            DbBackend::Sqlite => {
                for table in GUARDED_TABLES {
                    for op in ["UPDATE", "DELETE"] {
                        let name = op.to_ascii_lowercase();
                        db.execute_unprepared(&format!(
                            "CREATE TRIGGER trg_{table}_no_{name} BEFORE {op} ON {table} \
                             BEGIN SELECT RAISE(ABORT, '{table} is append-only'); END"
                        ))
                        .await?;
                    }
                }
            }
            backend => {
                return Err(DbErr::Migration(format!(
                    "append-only triggers are not implemented for {backend:?}"
                )));
            }
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        match manager.get_database_backend() {
            DbBackend::Postgres => {
                for table in GUARDED_TABLES {
                    db.execute_unprepared(&format!(
                        "DROP TRIGGER IF EXISTS trg_{table}_append_only ON {table}"
                    ))
                    .await?;
                }
                db.execute_unprepared("DROP FUNCTION IF EXISTS reject_append_only_change()")
                    .await?;
            }
            _ => {
                for table in GUARDED_TABLES {
                    for name in ["update", "delete"] {
                        db.execute_unprepared(&format!(
                            "DROP TRIGGER IF EXISTS trg_{table}_no_{name}"
                        ))
                        .await?;
                    }
                }
            }
        }
        Ok(())
    }
}

const POSTGRES_FUNCTION: &str = r"
CREATE OR REPLACE FUNCTION reject_append_only_change() RETURNS trigger AS $$
BEGIN
    RAISE EXCEPTION '% is append-only', TG_TABLE_NAME;
END;
$$ LANGUAGE plpgsql
";
