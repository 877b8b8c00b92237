//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{AppState, ApiError};
use rentflow_core::access::Actor;
use rentflow_db::UserRepository;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that resolves the calling actor.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Loads the user's current role from the database
/// 4. Stores the [`Actor`] in request extensions for handlers to access
///
/// Tokens carry only the user id, so a role change takes effect on the
/// next request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::unauthorized(
            "MISSING_TOKEN",
            "Authorization header with Bearer token is required",
        )
        .into_response();
    };

    let claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let users = UserRepository::new((*state.db).clone());
    match users.find_actor(claims.sub).await {
        Ok(Some(actor)) => {
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Ok(None) => {
            tracing::debug!(user_id = %claims.sub, "Token subject no longer exists");
            ApiError::unauthorized("UNKNOWN_USER", "Token subject does not exist").into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Extractor for the authenticated actor.
///
/// ```ignore
/// async fn handler(AuthActor(actor): AuthActor) -> impl IntoResponse {
///     actor.require_staff("do things")?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthActor(pub Actor);

impl<S> FromRequestParts<S> for AuthActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .map(AuthActor)
            .ok_or_else(|| ApiError::unauthorized("UNAUTHORIZED", "Authentication required"))
    }
}
