//! Payment routes: tenant submission and staff reconciliation.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use super::{notify_user, parse_currency, stored_money};
use crate::{ApiError, AppState, middleware::AuthActor};
use rentflow_core::payment::{PaymentStatus, SubmitPaymentInput};
use rentflow_db::{
    ConfirmOutcome, ReconciliationRepository,
    entities::{invoices, payments, receipts},
};
use rentflow_shared::notify::Notification;
use rentflow_shared::types::{InvoiceId, Money, PaymentId};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices/{invoice_id}/payments", post(submit_payment))
        .route("/payments/{payment_id}", get(get_payment))
        .route("/payments/{payment_id}/confirm", post(confirm_payment))
        .route("/payments/{payment_id}/fail", post(fail_payment))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a payment.
#[derive(Debug, Deserialize)]
pub struct SubmitPaymentRequest {
    /// Amount in minor units. Must equal the invoice amount.
    pub amount_minor: i64,
    /// ISO currency code. Must equal the invoice currency.
    pub currency: String,
    /// Bank or wallet reference.
    pub reference: String,
}

/// Request body for failing a payment.
#[derive(Debug, Deserialize)]
pub struct FailPaymentRequest {
    /// Why the payment failed.
    pub reason: String,
}

/// Response for a payment.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// Payment ID.
    pub id: Uuid,
    /// Invoice being paid.
    pub invoice_id: Uuid,
    /// Paying tenant.
    pub payer_id: Uuid,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Currency code.
    pub currency: String,
    /// Lifecycle status.
    pub status: &'static str,
    /// Tenant reference.
    pub reference: String,
    /// Provider that reported the payment, if any.
    pub provider: Option<String>,
    /// When the payment was confirmed.
    pub confirmed_at: Option<DateTime<FixedOffset>>,
    /// When the payment failed.
    pub failed_at: Option<DateTime<FixedOffset>>,
    /// Failure reason.
    pub failure_reason: Option<String>,
    /// Submission time.
    pub created_at: DateTime<FixedOffset>,
    /// Receipt, once confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ReceiptResponse>,
}

/// Response for a receipt.
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    /// Receipt ID.
    pub id: Uuid,
    /// Settled invoice.
    pub invoice_id: Uuid,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Currency code.
    pub currency: String,
    /// Issue time.
    pub issued_at: DateTime<FixedOffset>,
}

impl From<payments::Model> for PaymentResponse {
    fn from(model: payments::Model) -> Self {
        Self {
            id: model.id,
            invoice_id: model.invoice_id,
            payer_id: model.payer_id,
            amount_minor: model.amount_minor,
            currency: model.currency,
            status: PaymentStatus::from(model.status).as_str(),
            reference: model.reference,
            provider: model.provider,
            confirmed_at: model.confirmed_at,
            failed_at: model.failed_at,
            failure_reason: model.failure_reason,
            created_at: model.created_at,
            receipt: None,
        }
    }
}

impl From<receipts::Model> for ReceiptResponse {
    fn from(model: receipts::Model) -> Self {
        Self {
            id: model.id,
            invoice_id: model.invoice_id,
            amount_minor: model.amount_minor,
            currency: model.currency,
            issued_at: model.issued_at,
        }
    }
}

/// Renders a confirmation outcome. Replays answer 200 with `applied: false`.
pub(crate) fn confirm_body(outcome: &ConfirmOutcome) -> Value {
    match outcome {
        ConfirmOutcome::Applied {
            payment,
            receipt,
            entry,
            ..
        } => {
            let mut body = PaymentResponse::from(payment.clone());
            body.receipt = Some(receipt.clone().into());
            json!({
                "ok": true,
                "applied": true,
                "outcome": outcome.label(),
                "payment": body,
                "ledger_entry_id": entry.id,
            })
        }
        ConfirmOutcome::AlreadyConfirmed { payment } | ConfirmOutcome::AlreadyPaid { payment } => {
            json!({
                "ok": true,
                "applied": false,
                "outcome": outcome.label(),
                "payment": PaymentResponse::from(payment.clone()),
            })
        }
    }
}

/// Tells the payer their payment went through.
pub(crate) async fn notify_confirmed(
    state: &AppState,
    payment: &payments::Model,
    invoice: &invoices::Model,
) {
    let Some(amount) = stored_money(payment.amount_minor, &payment.currency) else {
        return;
    };
    let payment_id = PaymentId::from(payment.id);
    let invoice_number = invoice.number.clone();
    notify_user(state, payment.payer_id.into(), |to| {
        Notification::PaymentConfirmed {
            to,
            payment_id,
            invoice_number,
            amount,
        }
    })
    .await;
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/invoices/{invoice_id}/payments` - Submit a payment as the tenant.
async fn submit_payment(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(invoice_id): Path<InvoiceId>,
    payload: Result<Json<SubmitPaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let currency = parse_currency(&payload.currency)?;

    let input = SubmitPaymentInput {
        invoice_id,
        payer_id: actor.id,
        amount: Money::new(payload.amount_minor, currency),
        reference: payload.reference,
    };

    let repo = ReconciliationRepository::new((*state.db).clone());
    let payment = repo.submit_payment(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

/// GET `/payments/{payment_id}` - Fetch a payment with its receipt.
async fn get_payment(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(payment_id): Path<PaymentId>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let repo = ReconciliationRepository::new((*state.db).clone());
    let details = repo.find_details(&actor, payment_id).await?;

    let mut body = PaymentResponse::from(details.payment);
    body.receipt = details.receipt.map(ReceiptResponse::from);
    Ok(Json(body))
}

/// POST `/payments/{payment_id}/confirm` - Confirm a submitted payment.
async fn confirm_payment(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(payment_id): Path<PaymentId>,
) -> Result<Json<Value>, ApiError> {
    let repo = ReconciliationRepository::new((*state.db).clone());
    let outcome = repo.confirm_payment(&actor, payment_id).await?;

    if let ConfirmOutcome::Applied {
        payment, invoice, ..
    } = &outcome
    {
        notify_confirmed(&state, payment, invoice).await;
    }
    Ok(Json(confirm_body(&outcome)))
}

/// POST `/payments/{payment_id}/fail` - Mark a submitted payment failed.
async fn fail_payment(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(payment_id): Path<PaymentId>,
    payload: Result<Json<FailPaymentRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let repo = ReconciliationRepository::new((*state.db).clone());
    let outcome = repo
        .fail_payment(&actor, payment_id, &payload.reason)
        .await?;

    Ok(Json(json!({
        "ok": true,
        "applied": outcome.applied,
        "payment": PaymentResponse::from(outcome.payment),
    })))
}
