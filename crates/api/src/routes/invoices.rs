//! Invoice routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{notify_user, page_request, parse_currency, stored_money};
use crate::{ApiError, AppState, middleware::AuthActor};
use rentflow_core::invoice::{InvoiceStatus, NewInvoice};
use rentflow_db::{InvoiceFilter, InvoiceRepository, entities::invoices};
use rentflow_shared::notify::Notification;
use rentflow_shared::types::{InvoiceId, Money, PageResponse, UserId};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/{invoice_id}", get(get_invoice))
        .route("/invoices/{invoice_id}/issue", post(issue_invoice))
        .route("/invoices/{invoice_id}/void", post(void_invoice))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a draft invoice.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Owning landlord. Defaults to the caller.
    pub landlord_id: Option<Uuid>,
    /// Billed tenant.
    pub tenant_id: Uuid,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// ISO currency code.
    pub currency: String,
    /// Due date (YYYY-MM-DD).
    pub due_date: NaiveDate,
    /// Optional description.
    pub description: Option<String>,
}

/// Query parameters for listing invoices.
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    /// Filter by status.
    pub status: Option<String>,
    /// Filter by landlord (staff only).
    pub landlord_id: Option<Uuid>,
    /// Filter by tenant.
    pub tenant_id: Option<Uuid>,
    /// Page number (1-indexed).
    pub page: Option<u64>,
    /// Page size (default: 20, max: 100).
    pub per_page: Option<u64>,
}

/// Request body for voiding an invoice.
#[derive(Debug, Deserialize)]
pub struct VoidInvoiceRequest {
    /// Why the invoice is voided.
    pub reason: String,
}

/// Response for an invoice.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    /// Invoice ID.
    pub id: Uuid,
    /// Number, assigned on issue.
    pub number: Option<String>,
    /// Owning landlord.
    pub landlord_id: Uuid,
    /// Billed tenant.
    pub tenant_id: Uuid,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Currency code.
    pub currency: String,
    /// Amount formatted in major units.
    pub amount_display: Option<String>,
    /// Lifecycle status.
    pub status: &'static str,
    /// Description.
    pub description: Option<String>,
    /// Due date.
    pub due_date: NaiveDate,
    /// When the invoice was issued.
    pub issued_at: Option<DateTime<FixedOffset>>,
    /// When the invoice was paid.
    pub paid_at: Option<DateTime<FixedOffset>>,
    /// When the invoice was voided.
    pub voided_at: Option<DateTime<FixedOffset>>,
    /// Void reason.
    pub void_reason: Option<String>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<invoices::Model> for InvoiceResponse {
    fn from(model: invoices::Model) -> Self {
        let amount_display =
            stored_money(model.amount_minor, &model.currency).map(|m| m.to_string());
        Self {
            id: model.id,
            number: model.number,
            landlord_id: model.landlord_id,
            tenant_id: model.tenant_id,
            amount_minor: model.amount_minor,
            currency: model.currency,
            amount_display,
            status: InvoiceStatus::from(model.status).as_str(),
            description: model.description,
            due_date: model.due_date,
            issued_at: model.issued_at,
            paid_at: model.paid_at,
            voided_at: model.voided_at,
            void_reason: model.void_reason,
            created_at: model.created_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/invoices` - Create a draft invoice.
async fn create_invoice(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let currency = parse_currency(&payload.currency)?;

    let input = NewInvoice {
        landlord_id: payload.landlord_id.map_or(actor.id, UserId::from),
        tenant_id: payload.tenant_id.into(),
        amount: Money::new(payload.amount_minor, currency),
        due_date: payload.due_date,
        description: payload.description,
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    let invoice = repo.create_draft(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(invoice))))
}

/// GET `/invoices` - List invoices visible to the caller.
async fn list_invoices(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    query: Result<Query<ListInvoicesQuery>, QueryRejection>,
) -> Result<Json<PageResponse<InvoiceResponse>>, ApiError> {
    let Query(query) = query?;
    let status = match query.status.as_deref() {
        Some(raw) => Some(InvoiceStatus::parse(raw).ok_or_else(|| {
            ApiError::bad_request("INVALID_STATUS", format!("Unknown invoice status {raw:?}"))
        })?),
        None => None,
    };
    let filter = InvoiceFilter {
        status,
        landlord_id: query.landlord_id.map(UserId::from),
        tenant_id: query.tenant_id.map(UserId::from),
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    let page = repo
        .list(&actor, filter, page_request(query.page, query.per_page))
        .await?;
    Ok(Json(page.map(InvoiceResponse::from)))
}

/// GET `/invoices/{invoice_id}` - Fetch one invoice.
async fn get_invoice(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(invoice_id): Path<InvoiceId>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let repo = InvoiceRepository::new((*state.db).clone());
    let invoice = repo.find_visible(&actor, invoice_id).await?;
    Ok(Json(invoice.into()))
}

/// POST `/invoices/{invoice_id}/issue` - Assign a number and issue a draft.
async fn issue_invoice(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(invoice_id): Path<InvoiceId>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let repo = InvoiceRepository::new((*state.db).clone());
    let invoice = repo.issue(&actor, invoice_id).await?;

    if let (Some(number), Some(amount)) = (
        invoice.number.clone(),
        stored_money(invoice.amount_minor, &invoice.currency),
    ) {
        let due_date = invoice.due_date;
        notify_user(&state, invoice.tenant_id.into(), |to| {
            Notification::InvoiceIssued {
                to,
                invoice_number: number,
                amount,
                due_date,
            }
        })
        .await;
    }

    Ok(Json(invoice.into()))
}

/// POST `/invoices/{invoice_id}/void` - Void an unpaid invoice.
async fn void_invoice(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(invoice_id): Path<InvoiceId>,
    payload: Result<Json<VoidInvoiceRequest>, JsonRejection>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let Json(payload) = payload?;
    let repo = InvoiceRepository::new((*state.db).clone());
    let invoice = repo.void(&actor, invoice_id, &payload.reason).await?;
    Ok(Json(invoice.into()))
}
