//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Bearer authentication resolving the calling [`Actor`](rentflow_core::access::Actor)
//! - [`ApiError`], the JSON error envelope
//! - The background overdue sweep job

pub mod error;
pub mod jobs;
pub mod middleware;
pub mod routes;

pub use error::ApiError;

use axum::Router;
use rentflow_core::webhook::WebhookVerifier;
use rentflow_shared::{JwtService, Notifier};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Provider webhook signature policy.
    pub webhook_verifier: Arc<WebhookVerifier>,
    /// Outbound notification channel.
    pub notifier: Arc<dyn Notifier>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
