//! Landlord ledger routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{page_request, parse_currency};
use crate::{ApiError, AppState, middleware::AuthActor};
use rentflow_core::access::{Actor, Role};
use rentflow_core::ledger::{EntrySource, EntryType};
use rentflow_db::{LedgerRepository, entities::ledger_entries};
use rentflow_shared::types::{Money, PageResponse, UserId};

/// Creates the ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledger/{landlord_id}/balance", get(get_balance))
        .route("/ledger/{landlord_id}/entries", get(list_entries))
}

/// Query parameters for a balance.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// ISO currency code.
    pub currency: String,
}

/// Query parameters for the entry listing.
#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    /// Restrict to one currency.
    pub currency: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u64>,
    /// Page size (default: 20, max: 100).
    pub per_page: Option<u64>,
}

/// Response for a balance.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Landlord.
    pub landlord_id: UserId,
    /// Currency code.
    pub currency: &'static str,
    /// Credits minus debits, in minor units.
    pub balance_minor: i64,
    /// Sum of credits.
    pub credit_total_minor: i64,
    /// Sum of debits.
    pub debit_total_minor: i64,
    /// Balance formatted in major units.
    pub balance_display: String,
}

/// Response for one ledger entry.
#[derive(Debug, Serialize)]
pub struct LedgerEntryResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Currency code.
    pub currency: String,
    /// Credit or debit.
    pub entry_type: &'static str,
    /// Positive amount in minor units.
    pub amount_minor: i64,
    /// Payment or payout.
    pub source: &'static str,
    /// Source payment.
    pub payment_id: Option<Uuid>,
    /// Source payout.
    pub payout_id: Option<Uuid>,
    /// Position in the account.
    pub account_version: i64,
    /// Balance before the entry.
    pub previous_balance_minor: i64,
    /// Balance after the entry.
    pub current_balance_minor: i64,
    /// Memo.
    pub memo: Option<String>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<ledger_entries::Model> for LedgerEntryResponse {
    fn from(model: ledger_entries::Model) -> Self {
        Self {
            id: model.id,
            currency: model.currency,
            entry_type: EntryType::from(model.entry_type).as_str(),
            amount_minor: model.amount_minor,
            source: EntrySource::from(model.source).as_str(),
            payment_id: model.payment_id,
            payout_id: model.payout_id,
            account_version: model.account_version,
            previous_balance_minor: model.previous_balance_minor,
            current_balance_minor: model.current_balance_minor,
            memo: model.memo,
            created_at: model.created_at,
        }
    }
}

/// Landlords read their own ledger; staff read any.
fn require_ledger_access(actor: &Actor, landlord_id: UserId) -> Result<(), ApiError> {
    actor.require_role(&[Role::Landlord, Role::Staff], "read ledgers")?;
    actor.require_owner_or_staff(landlord_id, "ledger")?;
    Ok(())
}

/// GET `/ledger/{landlord_id}/balance?currency=` - Current balance.
async fn get_balance(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(landlord_id): Path<UserId>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let Query(query) = query?;
    let currency = parse_currency(&query.currency)?;
    require_ledger_access(&actor, landlord_id)?;

    let repo = LedgerRepository::new((*state.db).clone());
    let balance = repo.balance(landlord_id, currency).await?;

    Ok(Json(BalanceResponse {
        landlord_id,
        currency: currency.code(),
        balance_minor: balance.balance,
        credit_total_minor: balance.credit_total,
        debit_total_minor: balance.debit_total,
        balance_display: Money::new(balance.balance, currency).to_string(),
    }))
}

/// GET `/ledger/{landlord_id}/entries` - Audit listing in insertion order.
async fn list_entries(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(landlord_id): Path<UserId>,
    query: Result<Query<EntriesQuery>, QueryRejection>,
) -> Result<Json<PageResponse<LedgerEntryResponse>>, ApiError> {
    let Query(query) = query?;
    let currency = query.currency.as_deref().map(parse_currency).transpose()?;
    require_ledger_access(&actor, landlord_id)?;

    let repo = LedgerRepository::new((*state.db).clone());
    let page = repo
        .entries(landlord_id, currency, page_request(query.page, query.per_page))
        .await?;
    Ok(Json(page.map(LedgerEntryResponse::from)))
}
