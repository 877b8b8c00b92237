//! JSON error envelope for every handler.
//!
//! Domain errors carry their own status and code; this type only renders
//! them as `{"error": CODE, "message": text}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use rentflow_core::access::AccessError;
use rentflow_core::invoice::InvoiceError;
use rentflow_core::ledger::LedgerError;
use rentflow_core::payment::PaymentError;
use rentflow_core::payout::PayoutError;
use rentflow_core::webhook::WebhookError;
use rentflow_shared::JwtError;

/// An error response.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Creates an error with an explicit status.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with the given code.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// 401 with the given code.
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    /// 500 carrying the underlying detail for the log.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", detail)
    }

    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn from_domain(status: u16, code: &'static str, message: String) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                code = self.code,
                error = %self.message,
                "Request failed"
            );
            "An internal error occurred".to_string()
        } else {
            self.message
        };
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": message,
            })),
        )
            .into_response()
    }
}

macro_rules! domain_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for ApiError {
                fn from(e: $error) -> Self {
                    Self::from_domain(e.status_code(), e.error_code(), e.to_string())
                }
            }
        )+
    };
}

domain_error!(
    AccessError,
    InvoiceError,
    LedgerError,
    PaymentError,
    PayoutError,
    WebhookError,
);

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Expired => Self::unauthorized("TOKEN_EXPIRED", "Token has expired"),
            JwtError::Invalid(_) => {
                Self::unauthorized("INVALID_TOKEN", "Invalid or malformed token")
            }
            JwtError::Encoding(detail) => Self::internal(detail),
        }
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::internal(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("INVALID_BODY", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request("INVALID_QUERY", rejection.body_text())
    }
}
