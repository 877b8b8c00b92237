//! Overdue sweep rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rentflow_shared::types::InvoiceId;

use crate::invoice::{InvoiceSnapshot, InvoiceStateMachine, InvoiceStatus};

/// Result of one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Sweep date.
    pub today: Option<NaiveDate>,
    /// Candidates selected.
    pub examined: u64,
    /// Candidates actually moved to overdue.
    pub transitioned: u64,
}

/// Stateless service selecting invoices to mark overdue.
pub struct OverdueSweeper;

impl OverdueSweeper {
    /// Returns true when the invoice should move to overdue on `today`.
    ///
    /// Only issued invoices strictly past their due date qualify.
    #[must_use]
    pub fn is_eligible(status: InvoiceStatus, due_date: NaiveDate, today: NaiveDate) -> bool {
        matches!(
            InvoiceStateMachine::mark_overdue(status, due_date, today),
            Ok(Some(_))
        )
    }

    /// Ids of the invoices a sweep on `today` transitions.
    #[must_use]
    pub fn plan(invoices: &[InvoiceSnapshot], today: NaiveDate) -> Vec<InvoiceId> {
        invoices
            .iter()
            .filter(|inv| Self::is_eligible(inv.status, inv.due_date, today))
            .map(|inv| inv.id)
            .collect()
    }
}
