//! Overdue sweep repository.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use rentflow_core::invoice::InvoiceError;
use rentflow_core::overdue::{OverdueSweeper, SweepReport};

use super::snapshot::invoice_snapshot;
use crate::entities::invoices;
use crate::entities::sea_orm_active_enums::InvoiceStatus as DbInvoiceStatus;

fn db_err(e: DbErr) -> InvoiceError {
    InvoiceError::Database(e.to_string())
}

/// Overdue sweep repository.
#[derive(Debug, Clone)]
pub struct OverdueRepository {
    db: DatabaseConnection,
}

impl OverdueRepository {
    /// Creates a new overdue repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Moves every issued invoice due before `today` to overdue.
    ///
    /// Each invoice is updated on its own, guarded on still being issued
    /// and past due, so a confirmation landing mid-sweep keeps the invoice
    /// paid. Re-running on the same day transitions nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn sweep_overdue(&self, today: NaiveDate) -> Result<SweepReport, InvoiceError> {
        let candidates = invoices::Entity::find()
            .filter(invoices::Column::Status.eq(DbInvoiceStatus::Issued))
            .filter(invoices::Column::DueDate.lt(today))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let snapshots = candidates
            .iter()
            .map(invoice_snapshot)
            .collect::<Result<Vec<_>, _>>()
            .map_err(InvoiceError::Database)?;
        let due = OverdueSweeper::plan(&snapshots, today);

        let mut report = SweepReport {
            today: Some(today),
            examined: due.len() as u64,
            transitioned: 0,
        };
        for invoice_id in due {
            let now = Utc::now();
            let result = invoices::Entity::update_many()
                .col_expr(
                    invoices::Column::Status,
                    Expr::value(DbInvoiceStatus::Overdue),
                )
                .col_expr(invoices::Column::UpdatedAt, Expr::value(now))
                .filter(invoices::Column::Id.eq(invoice_id.into_inner()))
                .filter(invoices::Column::Status.eq(DbInvoiceStatus::Issued))
                .filter(invoices::Column::DueDate.lt(today))
                .exec(&self.db)
                .await
                .map_err(db_err)?;
            if result.rows_affected > 0 {
                report.transitioned += result.rows_affected;
                tracing::debug!(%invoice_id, "Invoice marked overdue");
            }
        }

        if report.transitioned > 0 {
            tracing::info!(
                %today,
                examined = report.examined,
                transitioned = report.transitioned,
                "Overdue sweep finished"
            );
        } else {
            tracing::debug!(%today, examined = report.examined, "Overdue sweep found nothing to do");
        }
        Ok(report)
    }
}
