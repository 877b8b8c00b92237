//! Payout routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use super::{notify_user, page_request, parse_currency, stored_money};
use crate::{ApiError, AppState, middleware::AuthActor};
use rentflow_core::payout::{PayoutDecision, PayoutStatus};
use rentflow_db::{PayoutFilter, PayoutRepository, entities::payouts};
use rentflow_shared::notify::Notification;
use rentflow_shared::types::{PageResponse, PayoutId, UserId};

/// Creates the payout routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payouts", get(list_payouts).post(request_payout))
        .route("/payouts/{payout_id}", get(get_payout))
        .route("/payouts/{payout_id}/decision", post(decide_payout))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a payout request.
#[derive(Debug, Deserialize)]
pub struct RequestPayoutRequest {
    /// Amount in minor units. Defaults to the full balance.
    pub amount_minor: Option<i64>,
    /// ISO currency code.
    pub currency: String,
    /// Optional notes.
    pub notes: Option<String>,
}

/// Query parameters for listing payouts.
#[derive(Debug, Deserialize)]
pub struct ListPayoutsQuery {
    /// Filter by status.
    pub status: Option<String>,
    /// Filter by landlord (staff only).
    pub landlord_id: Option<Uuid>,
    /// Page number (1-indexed).
    pub page: Option<u64>,
    /// Page size (default: 20, max: 100).
    pub per_page: Option<u64>,
}

/// Request body for a payout decision.
#[derive(Debug, Deserialize)]
pub struct DecidePayoutRequest {
    /// `approve` or `deny`.
    pub decision: String,
    /// Optional decision notes.
    pub notes: Option<String>,
}

/// Response for a payout.
#[derive(Debug, Serialize)]
pub struct PayoutResponse {
    /// Payout ID.
    pub id: Uuid,
    /// Requesting landlord.
    pub landlord_id: Uuid,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Currency code.
    pub currency: String,
    /// Lifecycle status.
    pub status: &'static str,
    /// Request notes.
    pub notes: Option<String>,
    /// Request time.
    pub requested_at: DateTime<FixedOffset>,
    /// Deciding staff member.
    pub decided_by: Option<Uuid>,
    /// Decision time.
    pub decided_at: Option<DateTime<FixedOffset>>,
    /// Decision notes.
    pub decision_notes: Option<String>,
}

impl From<payouts::Model> for PayoutResponse {
    fn from(model: payouts::Model) -> Self {
        Self {
            id: model.id,
            landlord_id: model.landlord_id,
            amount_minor: model.amount_minor,
            currency: model.currency,
            status: PayoutStatus::from(model.status).as_str(),
            notes: model.notes,
            requested_at: model.requested_at,
            decided_by: model.decided_by,
            decided_at: model.decided_at,
            decision_notes: model.decision_notes,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/payouts` - Request a payout as the landlord.
async fn request_payout(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    payload: Result<Json<RequestPayoutRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let currency = parse_currency(&payload.currency)?;

    let repo = PayoutRepository::new((*state.db).clone());
    let payout = repo
        .request_payout(&actor, payload.amount_minor, currency, payload.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(PayoutResponse::from(payout))))
}

/// GET `/payouts` - List payouts.
async fn list_payouts(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    query: Result<Query<ListPayoutsQuery>, QueryRejection>,
) -> Result<Json<PageResponse<PayoutResponse>>, ApiError> {
    let Query(query) = query?;
    let status = match query.status.as_deref() {
        Some(raw) => Some(PayoutStatus::parse(raw).ok_or_else(|| {
            ApiError::bad_request("INVALID_STATUS", format!("Unknown payout status {raw:?}"))
        })?),
        None => None,
    };
    let filter = PayoutFilter {
        status,
        landlord_id: query.landlord_id.map(UserId::from),
    };

    let repo = PayoutRepository::new((*state.db).clone());
    let page = repo
        .list(&actor, filter, page_request(query.page, query.per_page))
        .await?;
    Ok(Json(page.map(PayoutResponse::from)))
}

/// GET `/payouts/{payout_id}` - Fetch one payout.
async fn get_payout(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(payout_id): Path<PayoutId>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let repo = PayoutRepository::new((*state.db).clone());
    let payout = repo.find(&actor, payout_id).await?;
    Ok(Json(payout.into()))
}

/// POST `/payouts/{payout_id}/decision` - Approve or deny a pending payout.
async fn decide_payout(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(payout_id): Path<PayoutId>,
    payload: Result<Json<DecidePayoutRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let decision = PayoutDecision::parse(&payload.decision).ok_or_else(|| {
        ApiError::bad_request(
            "INVALID_DECISION",
            format!("Decision must be approve or deny, got {:?}", payload.decision),
        )
    })?;

    let repo = PayoutRepository::new((*state.db).clone());
    let outcome = repo
        .decide(&actor, payout_id, decision, payload.notes)
        .await?;

    if outcome.applied
        && let Some(amount) = stored_money(outcome.payout.amount_minor, &outcome.payout.currency)
    {
        let approved = decision == PayoutDecision::Approve;
        notify_user(&state, outcome.payout.landlord_id.into(), |to| {
            Notification::PayoutDecided {
                to,
                payout_id,
                approved,
                amount,
            }
        })
        .await;
    }

    Ok(Json(json!({
        "ok": true,
        "applied": outcome.applied,
        "payout": PayoutResponse::from(outcome.payout),
        "ledger_entry_id": outcome.entry.map(|entry| entry.id),
    })))
}
