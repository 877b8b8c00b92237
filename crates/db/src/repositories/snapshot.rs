//! Row to core snapshot conversions.

use std::str::FromStr;

use rentflow_core::invoice::InvoiceSnapshot;
use rentflow_core::payment::PaymentSnapshot;
use rentflow_core::payout::PayoutSnapshot;
use rentflow_shared::types::{Currency, Money};

use crate::entities::{invoices, payments, payouts};

/// Parses a stored currency code.
pub(crate) fn stored_currency(code: &str) -> Result<Currency, String> {
    Currency::from_str(code).map_err(|e| format!("stored currency is invalid: {e}"))
}

pub(crate) fn invoice_snapshot(model: &invoices::Model) -> Result<InvoiceSnapshot, String> {
    Ok(InvoiceSnapshot {
        id: model.id.into(),
        landlord_id: model.landlord_id.into(),
        tenant_id: model.tenant_id.into(),
        amount: Money::new(model.amount_minor, stored_currency(&model.currency)?),
        status: model.status.into(),
        due_date: model.due_date,
        number: model.number.clone(),
    })
}

pub(crate) fn payment_snapshot(model: &payments::Model) -> Result<PaymentSnapshot, String> {
    Ok(PaymentSnapshot {
        id: model.id.into(),
        invoice_id: model.invoice_id.into(),
        payer_id: model.payer_id.into(),
        amount: Money::new(model.amount_minor, stored_currency(&model.currency)?),
        status: model.status.into(),
    })
}

pub(crate) fn payout_snapshot(model: &payouts::Model) -> Result<PayoutSnapshot, String> {
    Ok(PayoutSnapshot {
        id: model.id.into(),
        landlord_id: model.landlord_id.into(),
        amount: Money::new(model.amount_minor, stored_currency(&model.currency)?),
        status: model.status.into(),
    })
}
