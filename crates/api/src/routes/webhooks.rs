//! Payment provider webhooks.
//!
//! The raw body is verified before it is parsed. Every accepted delivery
//! answers `{ok: true, applied}` so providers stop retrying; only
//! signature, payload and store failures answer with an error status.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::post,
};
use chrono::Utc;
use serde_json::{Value, json};
use tower_http::limit::RequestBodyLimitLayer;

use super::payments::notify_confirmed;
use crate::{ApiError, AppState};
use rentflow_core::webhook::{WebhookError, normalize_event};
use rentflow_db::{ConfirmOutcome, ProviderEventOutcome, ReconciliationRepository};

/// Header carrying the provider's event type, when sent outside the body.
pub const EVENT_TYPE_HEADER: &str = "x-event-type";

const MAX_WEBHOOK_BODY_BYTES: usize = 256 * 1024;

/// Creates the webhook routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks/{provider}", post(receive_webhook))
        .layer(RequestBodyLimitLayer::new(MAX_WEBHOOK_BODY_BYTES))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

const fn outcome_label(outcome: &ProviderEventOutcome) -> &'static str {
    match outcome {
        ProviderEventOutcome::Duplicate => "duplicate",
        ProviderEventOutcome::Recorded { .. } => "recorded",
        ProviderEventOutcome::Confirmed(confirm) => confirm.label(),
        ProviderEventOutcome::Failed(_) => "failed",
        ProviderEventOutcome::Ignored { .. } => "ignored",
    }
}

/// POST `/webhooks/{provider}` - Ingest one provider delivery.
async fn receive_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let signature = state
        .webhook_verifier
        .signature_header(&provider)
        .and_then(|name| header_str(&headers, name));
    state
        .webhook_verifier
        .verify(&provider, signature, &body, Utc::now().timestamp())
        .inspect_err(|e| tracing::warn!(%provider, error = %e, "Webhook rejected"))?;

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
    let Some(event) = normalize_event(&provider, header_str(&headers, EVENT_TYPE_HEADER), &payload)?
    else {
        tracing::debug!(%provider, "Webhook event type not handled");
        return Ok(Json(json!({ "ok": true, "applied": false, "outcome": "unhandled" })));
    };

    let repo = ReconciliationRepository::new((*state.db).clone());
    let outcome = repo.apply_provider_event(&event).await?;

    if let ProviderEventOutcome::Confirmed(ConfirmOutcome::Applied {
        payment, invoice, ..
    }) = &outcome
    {
        notify_confirmed(&state, payment, invoice).await;
    }

    Ok(Json(json!({
        "ok": true,
        "applied": outcome.is_applied(),
        "outcome": outcome_label(&outcome),
        "event_id": event.event_id,
    })))
}
