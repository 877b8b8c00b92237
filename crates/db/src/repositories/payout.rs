//! Payout repository.
//!
//! Approval locks the payout row, then the landlord's ledger account, and
//! re-folds the balance before appending the debit. Two approvals racing
//! on one landlord therefore see each other's debits.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use rentflow_core::access::{Actor, Role};
use rentflow_core::payout::{
    PayoutAction, PayoutDecision, PayoutEngine, PayoutError, PayoutPlan, PayoutStatus,
};
use rentflow_shared::types::{Currency, PageRequest, PageResponse, PayoutId, UserId};

use super::ledger::LedgerRepository;
use super::snapshot::payout_snapshot;
use crate::entities::sea_orm_active_enums::PayoutStatus as DbPayoutStatus;
use crate::entities::{ledger_entries, payouts};

fn db_err(e: DbErr) -> PayoutError {
    PayoutError::Database(e.to_string())
}

/// Filter options for listing payouts.
#[derive(Debug, Clone, Default)]
pub struct PayoutFilter {
    /// Only payouts in this status.
    pub status: Option<PayoutStatus>,
    /// Only payouts of this landlord (staff only).
    pub landlord_id: Option<UserId>,
}

/// Result of a payout decision.
#[derive(Debug, Clone)]
pub struct PayoutDecisionOutcome {
    /// Payout as stored after the call.
    pub payout: payouts::Model,
    /// False when the same decision had already been taken.
    pub applied: bool,
    /// Debit appended by an approval.
    pub entry: Option<ledger_entries::Model>,
}

/// Payout repository.
#[derive(Debug, Clone)]
pub struct PayoutRepository {
    db: DatabaseConnection,
}

impl PayoutRepository {
    /// Creates a new payout repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Files a pending payout request for the acting landlord.
    ///
    /// An omitted amount defaults to the current balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not a landlord or the resolved
    /// amount is not positive.
    pub async fn request_payout(
        &self,
        actor: &Actor,
        amount_minor: Option<i64>,
        currency: Currency,
        notes: Option<String>,
    ) -> Result<payouts::Model, PayoutError> {
        actor.require_role(&[Role::Landlord], "request payouts")?;

        let balance = LedgerRepository::balance_in(&self.db, actor.id, currency).await?;
        let amount = PayoutEngine::resolve_requested_amount(amount_minor, currency, balance.balance)?;

        let now = Utc::now().into();
        let payout = payouts::ActiveModel {
            id: Set(PayoutId::new().into()),
            landlord_id: Set(actor.id.into()),
            amount_minor: Set(amount.amount_minor),
            currency: Set(currency.code().to_string()),
            status: Set(DbPayoutStatus::Pending),
            notes: Set(notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())),
            requested_at: Set(now),
            decided_by: Set(None),
            decided_at: Set(None),
            decision_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        tracing::info!(
            payout_id = %payout.id,
            landlord_id = %actor.id,
            %amount,
            defaulted = amount_minor.is_none(),
            "Payout requested"
        );
        Ok(payout)
    }

    /// Approves or denies a pending payout.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not staff, the payout is missing,
    /// a different decision was already taken, or an approval exceeds the
    /// balance.
    pub async fn decide(
        &self,
        actor: &Actor,
        payout_id: PayoutId,
        decision: PayoutDecision,
        notes: Option<String>,
    ) -> Result<PayoutDecisionOutcome, PayoutError> {
        actor.require_staff("decide payouts")?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let payout = payouts::Entity::find_by_id(payout_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(PayoutError::NotFound(payout_id))?;
        let snapshot = payout_snapshot(&payout).map_err(PayoutError::Database)?;

        let action = match PayoutEngine::plan_decision(&snapshot, decision, actor.id, notes)? {
            PayoutPlan::Unchanged => {
                tracing::debug!(%payout_id, status = %snapshot.status, "Payout decision repeated");
                return Ok(PayoutDecisionOutcome {
                    payout,
                    applied: false,
                    entry: None,
                });
            }
            PayoutPlan::Apply(action) => action,
        };

        let new_status = action.new_status();
        let entry = match action {
            PayoutAction::Approve {
                decided_by,
                decided_at,
                notes,
                debit,
            } => {
                LedgerRepository::lock_account_in(&txn, snapshot.landlord_id, snapshot.amount.currency)
                    .await?;
                let balance = LedgerRepository::balance_in(
                    &txn,
                    snapshot.landlord_id,
                    snapshot.amount.currency,
                )
                .await?;
                PayoutEngine::ensure_funds(balance.balance, snapshot.amount.amount_minor)?;

                stamp_decision(&txn, payout_id, new_status, decided_by, decided_at, notes).await?;
                Some(LedgerRepository::append_entry_in(&txn, &debit).await?)
            }
            PayoutAction::Deny {
                decided_by,
                decided_at,
                notes,
            } => {
                stamp_decision(&txn, payout_id, new_status, decided_by, decided_at, notes).await?;
                None
            }
        };

        let payout = payouts::Entity::find_by_id(payout_id.into_inner())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(PayoutError::NotFound(payout_id))?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            %payout_id,
            decided_by = %actor.id,
            status = %new_status,
            amount = %snapshot.amount,
            "Payout decided"
        );
        Ok(PayoutDecisionOutcome {
            payout,
            applied: true,
            entry,
        })
    }

    /// Finds a payout visible to the actor.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the payout is missing or belongs to another
    /// landlord.
    pub async fn find(
        &self,
        actor: &Actor,
        payout_id: PayoutId,
    ) -> Result<payouts::Model, PayoutError> {
        let payout = payouts::Entity::find_by_id(payout_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(PayoutError::NotFound(payout_id))?;
        if !actor.can_view(&[payout.landlord_id.into()]) {
            return Err(PayoutError::NotFound(payout_id));
        }
        Ok(payout)
    }

    /// Lists payouts, newest first. Landlords only see their own.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is a tenant or the query fails.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: PayoutFilter,
        page: PageRequest,
    ) -> Result<PageResponse<payouts::Model>, PayoutError> {
        actor.require_role(&[Role::Landlord, Role::Staff], "list payouts")?;

        let landlord_id = if actor.is_staff() {
            filter.landlord_id
        } else {
            Some(actor.id)
        };

        let mut query = payouts::Entity::find();
        if let Some(landlord_id) = landlord_id {
            query = query.filter(payouts::Column::LandlordId.eq(landlord_id.into_inner()));
        }
        if let Some(status) = filter.status {
            query = query.filter(payouts::Column::Status.eq(DbPayoutStatus::from(status)));
        }

        let paginator = query
            .order_by_desc(payouts::Column::RequestedAt)
            .order_by_desc(payouts::Column::Id)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(db_err)?;
        let data = paginator
            .fetch_page(page.page_index())
            .await
            .map_err(db_err)?;
        Ok(PageResponse::new(data, page, total))
    }
}

async fn stamp_decision(
    txn: &DatabaseTransaction,
    payout_id: PayoutId,
    new_status: PayoutStatus,
    decided_by: UserId,
    decided_at: chrono::DateTime<Utc>,
    notes: Option<String>,
) -> Result<(), PayoutError> {
    let result = payouts::Entity::update_many()
        .col_expr(
            payouts::Column::Status,
            Expr::value(DbPayoutStatus::from(new_status)),
        )
        .col_expr(payouts::Column::DecidedBy, Expr::value(decided_by.into_inner()))
        .col_expr(payouts::Column::DecidedAt, Expr::value(decided_at))
        .col_expr(payouts::Column::DecisionNotes, Expr::value(notes))
        .col_expr(payouts::Column::UpdatedAt, Expr::value(decided_at))
        .filter(payouts::Column::Id.eq(payout_id.into_inner()))
        .filter(payouts::Column::Status.eq(DbPayoutStatus::Pending))
        .exec(txn)
        .await
        .map_err(db_err)?;
    if result.rows_affected == 0 {
        let stored = payouts::Entity::find_by_id(payout_id.into_inner())
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or(PayoutError::NotFound(payout_id))?;
        return Err(PayoutError::AlreadyDecided {
            status: stored.status.into(),
        });
    }
    Ok(())
}
