//! Webhook ingestion errors.

use thiserror::Error;

use crate::payment::PaymentError;

/// Errors that can occur while ingesting a provider webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Delivery failed signature or provider checks.
    #[error("Webhook from {provider} rejected: {reason}")]
    Unauthorized {
        /// Provider path segment.
        provider: String,
        /// What failed.
        reason: &'static str,
    },

    /// The body could not be understood.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// Reconciliation rejected the event.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    pub(crate) fn unauthorized(provider: &str, reason: &'static str) -> Self {
        Self::Unauthorized {
            provider: provider.to_string(),
            reason,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 401,
            Self::InvalidPayload(_) => 400,
            Self::Payment(e) => e.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::Payment(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
