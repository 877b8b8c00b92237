//! Payout engine.
//!
//! Requests default to the landlord's current balance. Approval is only
//! valid while the folded balance covers the amount; the repository
//! re-checks that under the ledger account lock.

use chrono::Utc;

use rentflow_shared::types::{Currency, Money, UserId};

use crate::ledger::LedgerService;
use crate::payout::error::PayoutError;
use crate::payout::types::{PayoutAction, PayoutDecision, PayoutPlan, PayoutSnapshot, PayoutStatus};

/// Stateless service for payout requests and decisions.
pub struct PayoutEngine;

impl PayoutEngine {
    /// Resolves the amount of a new request.
    ///
    /// An omitted amount means "everything available".
    pub fn resolve_requested_amount(
        requested: Option<i64>,
        currency: Currency,
        balance: i64,
    ) -> Result<Money, PayoutError> {
        let amount = requested.unwrap_or(balance);
        if amount <= 0 {
            return Err(PayoutError::InvalidAmount(amount));
        }
        Ok(Money::new(amount, currency))
    }

    /// Plans a decision on `payout`.
    ///
    /// # Returns
    /// * `Ok(PayoutPlan::Apply)` for a pending payout
    /// * `Ok(PayoutPlan::Unchanged)` if the same decision was already taken
    /// * `Err(PayoutError::AlreadyDecided)` if a different decision was taken
    pub fn plan_decision(
        payout: &PayoutSnapshot,
        decision: PayoutDecision,
        decided_by: UserId,
        notes: Option<String>,
    ) -> Result<PayoutPlan, PayoutError> {
        match payout.status {
            PayoutStatus::Pending => {}
            status if status == decision.resulting_status() => return Ok(PayoutPlan::Unchanged),
            status => return Err(PayoutError::AlreadyDecided { status }),
        }

        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let decided_at = Utc::now();
        let action = match decision {
            PayoutDecision::Approve => PayoutAction::Approve {
                decided_by,
                decided_at,
                debit: LedgerService::debit_for_payout(
                    payout.landlord_id,
                    payout.id,
                    payout.amount,
                    Some(format!("Payout {}", payout.id)),
                )?,
                notes,
            },
            PayoutDecision::Deny => PayoutAction::Deny {
                decided_by,
                decided_at,
                notes,
            },
        };
        Ok(PayoutPlan::Apply(action))
    }

    /// Checks that `available` covers `requested`.
    pub fn ensure_funds(available: i64, requested: i64) -> Result<(), PayoutError> {
        if available < requested {
            return Err(PayoutError::InsufficientBalance {
                available,
                requested,
            });
        }
        Ok(())
    }
}
