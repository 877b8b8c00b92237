//! Maps provider payloads onto [`NormalizedEvent`].
//!
//! Three payload families are understood:
//! - stripe-like: `{id, type, data: {object: {id, amount, currency, metadata}}}`
//! - razorpay-like: `{event, payload: {payment: {entity: {id, amount, currency, notes}}}}`
//! - generic: `{event_id, status, payment_id}` or
//!   `{event_id, status, invoice_id, external_id, amount_minor, currency}`
//!
//! Event types that do not concern payments normalize to `None`.

use serde_json::Value;

use rentflow_shared::types::{Currency, InvoiceId, Money, PaymentId};

use crate::webhook::error::WebhookError;
use crate::webhook::types::{NormalizedEvent, PaymentRef, ProviderStatus};

/// Payload family a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// `type` + `data.object`.
    Stripe,
    /// `event` + `payload.payment.entity`.
    Razorpay,
    /// Flat internal format.
    Generic,
}

impl PayloadFormat {
    /// Format used by the provider registered under `provider`.
    #[must_use]
    pub fn for_provider(provider: &str) -> Self {
        let provider = provider.to_ascii_lowercase();
        if provider.starts_with("stripe") {
            Self::Stripe
        } else if provider.starts_with("razorpay") {
            Self::Razorpay
        } else {
            Self::Generic
        }
    }
}

/// Normalizes a delivery.
///
/// `event_type` comes from a header when the provider sends one; otherwise
/// the type is read from the payload. The provider name is lowercased so
/// dedupe keys match however the path was typed.
pub fn normalize_event(
    provider: &str,
    event_type: Option<&str>,
    payload: &Value,
) -> Result<Option<NormalizedEvent>, WebhookError> {
    if !payload.is_object() {
        return Err(invalid("body must be a JSON object"));
    }
    let provider = provider.trim().to_ascii_lowercase();
    match PayloadFormat::for_provider(&provider) {
        PayloadFormat::Stripe => normalize_stripe(&provider, event_type, payload),
        PayloadFormat::Razorpay => normalize_razorpay(&provider, event_type, payload),
        PayloadFormat::Generic => normalize_generic(&provider, event_type, payload),
    }
}

fn invalid(msg: impl Into<String>) -> WebhookError {
    WebhookError::InvalidPayload(msg.into())
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn require_str<'a>(value: &'a Value, pointer: &str) -> Result<&'a str, WebhookError> {
    str_at(value, pointer).ok_or_else(|| invalid(format!("missing {pointer}")))
}

fn amount_at(value: &Value, pointer: &str) -> Result<i64, WebhookError> {
    value
        .pointer(pointer)
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid(format!("missing integer {pointer}")))
}

fn currency_at(value: &Value, pointer: &str) -> Result<Currency, WebhookError> {
    require_str(value, pointer)?
        .parse::<Currency>()
        .map_err(|e| invalid(e.to_string()))
}

fn parse_payment_id(raw: &str) -> Result<PaymentId, WebhookError> {
    raw.parse()
        .map_err(|_| invalid(format!("payment id {raw:?} is not a UUID")))
}

fn parse_invoice_id(raw: &str) -> Result<InvoiceId, WebhookError> {
    raw.parse()
        .map_err(|_| invalid(format!("invoice id {raw:?} is not a UUID")))
}

/// Resolves the payment reference from an object carrying our ids in a
/// metadata map, falling back to the provider's own payment id.
fn payment_ref_from(
    object: &Value,
    metadata_key: &str,
    amount: impl FnOnce() -> Result<Money, WebhookError>,
) -> Result<PaymentRef, WebhookError> {
    if let Some(raw) = str_at(object, &format!("/{metadata_key}/payment_id")) {
        return Ok(PaymentRef::Known(parse_payment_id(raw)?));
    }
    let Some(invoice_raw) = str_at(object, &format!("/{metadata_key}/invoice_id")) else {
        return Err(invalid(format!(
            "{metadata_key} carries neither payment_id nor invoice_id"
        )));
    };
    Ok(PaymentRef::External {
        invoice_id: parse_invoice_id(invoice_raw)?,
        external_id: require_str(object, "/id")?.to_string(),
        amount: amount()?,
    })
}

fn normalize_stripe(
    provider: &str,
    event_type: Option<&str>,
    payload: &Value,
) -> Result<Option<NormalizedEvent>, WebhookError> {
    let event_type = match event_type {
        Some(t) => t,
        None => require_str(payload, "/type")?,
    };
    let status = match event_type {
        "payment_intent.succeeded" | "charge.succeeded" | "checkout.session.completed" => {
            ProviderStatus::Succeeded
        }
        "payment_intent.payment_failed" | "payment_intent.canceled" | "charge.failed" => {
            ProviderStatus::Failed
        }
        "payment_intent.requires_action" => ProviderStatus::RequiresAction,
        "payment_intent.created" | "payment_intent.processing" | "charge.pending" => {
            ProviderStatus::Pending
        }
        _ => return Ok(None),
    };

    let event_id = require_str(payload, "/id")?.to_string();
    let object = payload
        .pointer("/data/object")
        .filter(|o| o.is_object())
        .ok_or_else(|| invalid("missing /data/object"))?;
    let payment_ref = payment_ref_from(object, "metadata", || {
        let amount = object
            .get("amount_received")
            .and_then(Value::as_i64)
            .filter(|a| *a > 0)
            .map_or_else(|| amount_at(object, "/amount"), Ok)?;
        Ok(Money::new(amount, currency_at(object, "/currency")?))
    })?;
    let failure_reason = str_at(object, "/last_payment_error/message")
        .or_else(|| str_at(object, "/failure_message"))
        .map(str::to_string);

    Ok(Some(NormalizedEvent {
        provider: provider.to_string(),
        event_id,
        event_type: event_type.to_string(),
        status,
        payment_ref,
        failure_reason,
    }))
}

fn normalize_razorpay(
    provider: &str,
    event_type: Option<&str>,
    payload: &Value,
) -> Result<Option<NormalizedEvent>, WebhookError> {
    let event_type = match event_type {
        Some(t) => t,
        None => require_str(payload, "/event")?,
    };
    let status = match event_type {
        "payment.captured" | "order.paid" => ProviderStatus::Succeeded,
        "payment.failed" => ProviderStatus::Failed,
        "payment.authorized" => ProviderStatus::Pending,
        _ => return Ok(None),
    };

    let entity = payload
        .pointer("/payload/payment/entity")
        .filter(|e| e.is_object())
        .ok_or_else(|| invalid("missing /payload/payment/entity"))?;
    let external_id = require_str(entity, "/id")?;
    // Razorpay sends the delivery id as a header; fall back to a key that is
    // stable across redeliveries of the same event.
    let event_id = str_at(payload, "/id").map_or_else(
        || format!("{event_type}:{external_id}"),
        str::to_string,
    );
    let payment_ref = payment_ref_from(entity, "notes", || {
        Ok(Money::new(
            amount_at(entity, "/amount")?,
            currency_at(entity, "/currency")?,
        ))
    })?;
    let failure_reason = str_at(entity, "/error_description").map(str::to_string);

    Ok(Some(NormalizedEvent {
        provider: provider.to_string(),
        event_id,
        event_type: event_type.to_string(),
        status,
        payment_ref,
        failure_reason,
    }))
}

fn normalize_generic(
    provider: &str,
    event_type: Option<&str>,
    payload: &Value,
) -> Result<Option<NormalizedEvent>, WebhookError> {
    let event_type = event_type
        .or_else(|| str_at(payload, "/event_type"))
        .unwrap_or("payment.updated");
    if !event_type.starts_with("payment") {
        return Ok(None);
    }

    let event_id = require_str(payload, "/event_id")?.to_string();
    let raw_status = require_str(payload, "/status")?;
    let status = ProviderStatus::parse(raw_status)
        .ok_or_else(|| invalid(format!("unknown status {raw_status:?}")))?;

    let payment_ref = if let Some(raw) = str_at(payload, "/payment_id") {
        PaymentRef::Known(parse_payment_id(raw)?)
    } else {
        PaymentRef::External {
            invoice_id: parse_invoice_id(require_str(payload, "/invoice_id")?)?,
            external_id: require_str(payload, "/external_id")?.to_string(),
            amount: Money::new(
                amount_at(payload, "/amount_minor")?,
                currency_at(payload, "/currency")?,
            ),
        }
    };
    let failure_reason = str_at(payload, "/failure_reason").map(str::to_string);

    Ok(Some(NormalizedEvent {
        provider: provider.to_string(),
        event_id,
        event_type: event_type.to_string(),
        status,
        payment_ref,
        failure_reason,
    }))
}
