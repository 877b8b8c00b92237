//! Best-effort outbound notifications.
//!
//! Notifications are sent after the financial write has committed. A
//! failed send is logged and dropped; it never reaches the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{Money, PaymentId, PayoutId};

/// Notification delivery failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Recipient address rejected.
    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),
    /// Message could not be built.
    #[error("Failed to build message: {0}")]
    Build(String),
    /// Transport failure.
    #[error("Failed to deliver message: {0}")]
    Transport(String),
}

/// A message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Sent to a tenant when an invoice is issued.
    InvoiceIssued {
        /// Recipient email.
        to: String,
        /// Assigned invoice number.
        invoice_number: String,
        /// Amount due.
        amount: Money,
        /// Due date.
        due_date: NaiveDate,
    },
    /// Sent to a tenant once their payment is confirmed.
    PaymentConfirmed {
        /// Recipient email.
        to: String,
        /// Confirmed payment.
        payment_id: PaymentId,
        /// Invoice number, when issued.
        invoice_number: Option<String>,
        /// Amount received.
        amount: Money,
    },
    /// Sent to a landlord when staff decide a payout.
    PayoutDecided {
        /// Recipient email.
        to: String,
        /// Decided payout.
        payout_id: PayoutId,
        /// Approved or denied.
        approved: bool,
        /// Requested amount.
        amount: Money,
    },
}

impl Notification {
    /// Recipient email address.
    #[must_use]
    pub fn recipient(&self) -> &str {
        match self {
            Self::InvoiceIssued { to, .. }
            | Self::PaymentConfirmed { to, .. }
            | Self::PayoutDecided { to, .. } => to,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvoiceIssued { .. } => "invoice_issued",
            Self::PaymentConfirmed { .. } => "payment_confirmed",
            Self::PayoutDecided { .. } => "payout_decided",
        }
    }

    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        match self {
            Self::InvoiceIssued { invoice_number, .. } => {
                format!("Rent invoice {invoice_number}")
            }
            Self::PaymentConfirmed { amount, .. } => format!("Payment of {amount} received"),
            Self::PayoutDecided { approved: true, .. } => "Your payout was approved".to_string(),
            Self::PayoutDecided { approved: false, .. } => "Your payout was denied".to_string(),
        }
    }

    /// Plain-text body.
    #[must_use]
    pub fn body(&self) -> String {
        match self {
            Self::InvoiceIssued {
                invoice_number,
                amount,
                due_date,
                ..
            } => format!(
                "Invoice {invoice_number} for {amount} has been issued and is due on {due_date}."
            ),
            Self::PaymentConfirmed {
                payment_id,
                invoice_number,
                amount,
                ..
            } => {
                let invoice = invoice_number.as_deref().unwrap_or("your invoice");
                format!("We confirmed payment {payment_id} of {amount} against {invoice}.")
            }
            Self::PayoutDecided {
                payout_id,
                approved,
                amount,
                ..
            } => {
                let verdict = if *approved { "approved" } else { "denied" };
                format!("Payout request {payout_id} for {amount} was {verdict}.")
            }
        }
    }
}

/// A notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            kind = notification.kind(),
            to = notification.recipient(),
            subject = %notification.subject(),
            "Notification (log only)"
        );
        Ok(())
    }
}

/// Sends a notification on a background task, logging failures.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&notification).await {
            tracing::warn!(
                error = %e,
                kind = notification.kind(),
                to = notification.recipient(),
                "Notification delivery failed"
            );
        }
    });
}
