//! API route definitions.

use axum::{Router, middleware};

use crate::{ApiError, AppState, middleware::auth::auth_middleware};
use rentflow_db::UserRepository;
use rentflow_shared::notify::{Notification, dispatch};
use rentflow_shared::types::{Currency, Money, PageRequest, UserId};

pub mod admin;
pub mod health;
pub mod invoices;
pub mod ledger;
pub mod payments;
pub mod payouts;
pub mod webhooks;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Everything except health and provider webhooks needs an actor
    let protected_routes = Router::new()
        .merge(invoices::routes())
        .merge(payments::routes())
        .merge(ledger::routes())
        .merge(payouts::routes())
        .merge(admin::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(webhooks::routes())
        .merge(protected_routes)
}

/// Parses a currency code from a request.
pub(crate) fn parse_currency(raw: &str) -> Result<Currency, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("INVALID_CURRENCY", format!("Unknown currency {raw:?}")))
}

/// Rebuilds an amount from its stored columns.
pub(crate) fn stored_money(amount_minor: i64, currency: &str) -> Option<Money> {
    currency
        .parse::<Currency>()
        .ok()
        .map(|currency| Money::new(amount_minor, currency))
}

/// Builds a page request from optional query parameters.
pub(crate) fn page_request(page: Option<u64>, per_page: Option<u64>) -> PageRequest {
    let default = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(default.page).max(1),
        per_page: per_page.unwrap_or(default.per_page),
    }
}

/// Sends a notification to a user after a committed write.
///
/// The recipient lookup and the send are both best effort.
pub(crate) async fn notify_user(
    state: &AppState,
    user_id: UserId,
    build: impl FnOnce(String) -> Notification,
) {
    let users = UserRepository::new((*state.db).clone());
    match users.find_by_id(user_id).await {
        Ok(Some(user)) => dispatch(state.notifier.clone(), build(user.email)),
        Ok(None) => tracing::warn!(%user_id, "Notification recipient not found"),
        Err(e) => tracing::warn!(%user_id, error = %e, "Notification recipient lookup failed"),
    }
}
