//! Invoice state machine.
//!
//! Pure transition rules. Callers persist the returned [`InvoiceAction`]
//! with a write guarded on the status they validated against.

use chrono::{NaiveDate, Utc};

use rentflow_shared::types::UserId;

use crate::invoice::error::InvoiceError;
use crate::invoice::number::InvoiceNumber;
use crate::invoice::types::{InvoiceAction, InvoiceStatus, NewInvoice};

/// Stateless service for invoice transitions.
pub struct InvoiceStateMachine;

impl InvoiceStateMachine {
    /// Validates input for a new draft invoice.
    pub fn validate_new_invoice(input: &NewInvoice) -> Result<(), InvoiceError> {
        if !input.amount.is_positive() {
            return Err(InvoiceError::NonPositiveAmount(input.amount.amount_minor));
        }
        if input.landlord_id == input.tenant_id {
            return Err(InvoiceError::SelfBilling);
        }
        Ok(())
    }

    /// Issue a draft invoice under `number`.
    ///
    /// # Returns
    /// * `Ok(InvoiceAction::Issue)` for a draft without a number
    /// * `Err(InvoiceError::NumberAlreadyAssigned)` if a number exists
    /// * `Err(InvoiceError::InvalidTransition)` if not in Draft status
    pub fn issue(
        current_status: InvoiceStatus,
        existing_number: Option<&str>,
        number: InvoiceNumber,
    ) -> Result<InvoiceAction, InvoiceError> {
        if let Some(existing) = existing_number {
            return Err(InvoiceError::NumberAlreadyAssigned(existing.to_string()));
        }
        match current_status {
            InvoiceStatus::Draft => Ok(InvoiceAction::Issue {
                new_status: InvoiceStatus::Issued,
                number,
                issued_at: Utc::now(),
            }),
            _ => Err(InvoiceError::InvalidTransition {
                from: current_status,
                to: InvoiceStatus::Issued,
            }),
        }
    }

    /// Move an issued invoice past its due date to overdue.
    ///
    /// # Returns
    /// * `Ok(Some(InvoiceAction::MarkOverdue))` for an issued invoice due before `today`
    /// * `Ok(None)` if already paid or overdue, so sweeps can re-run freely
    /// * `Err(InvoiceError::NotYetDue)` if issued but not yet due
    /// * `Err(InvoiceError::InvalidTransition)` for draft or void invoices
    pub fn mark_overdue(
        current_status: InvoiceStatus,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Option<InvoiceAction>, InvoiceError> {
        match current_status {
            InvoiceStatus::Paid | InvoiceStatus::Overdue => Ok(None),
            InvoiceStatus::Issued if due_date < today => Ok(Some(InvoiceAction::MarkOverdue {
                new_status: InvoiceStatus::Overdue,
                marked_at: Utc::now(),
            })),
            InvoiceStatus::Issued => Err(InvoiceError::NotYetDue { due_date, today }),
            InvoiceStatus::Draft | InvoiceStatus::Void => Err(InvoiceError::InvalidTransition {
                from: current_status,
                to: InvoiceStatus::Overdue,
            }),
        }
    }

    /// Settle an issued or overdue invoice.
    ///
    /// # Returns
    /// * `Ok(InvoiceAction::MarkPaid)` from Issued or Overdue
    /// * `Err(InvoiceError::AlreadyPaid)` if already paid
    /// * `Err(InvoiceError::InvalidTransition)` for draft or void invoices
    pub fn mark_paid(current_status: InvoiceStatus) -> Result<InvoiceAction, InvoiceError> {
        match current_status {
            InvoiceStatus::Issued | InvoiceStatus::Overdue => Ok(InvoiceAction::MarkPaid {
                new_status: InvoiceStatus::Paid,
                paid_at: Utc::now(),
            }),
            InvoiceStatus::Paid => Err(InvoiceError::AlreadyPaid),
            InvoiceStatus::Draft | InvoiceStatus::Void => Err(InvoiceError::InvalidTransition {
                from: current_status,
                to: InvoiceStatus::Paid,
            }),
        }
    }

    /// Void a non-terminal invoice.
    ///
    /// # Returns
    /// * `Ok(InvoiceAction::Void)` from Draft, Issued or Overdue
    /// * `Err(InvoiceError::VoidReasonRequired)` if reason is blank
    /// * `Err(InvoiceError::InvalidTransition)` from Paid or Void
    pub fn void(
        current_status: InvoiceStatus,
        voided_by: UserId,
        reason: &str,
    ) -> Result<InvoiceAction, InvoiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(InvoiceError::VoidReasonRequired);
        }
        if current_status.is_terminal() {
            return Err(InvoiceError::InvalidTransition {
                from: current_status,
                to: InvoiceStatus::Void,
            });
        }
        Ok(InvoiceAction::Void {
            new_status: InvoiceStatus::Void,
            voided_by,
            voided_at: Utc::now(),
            reason: reason.to_string(),
        })
    }

    /// Checks a transition against the state machine.
    #[must_use]
    pub const fn is_valid_transition(from: InvoiceStatus, to: InvoiceStatus) -> bool {
        matches!(
            (from, to),
            (InvoiceStatus::Draft, InvoiceStatus::Issued)
                | (InvoiceStatus::Issued, InvoiceStatus::Overdue)
                | (
                    InvoiceStatus::Issued | InvoiceStatus::Overdue,
                    InvoiceStatus::Paid
                )
                | (
                    InvoiceStatus::Draft | InvoiceStatus::Issued | InvoiceStatus::Overdue,
                    InvoiceStatus::Void
                )
        )
    }
}
