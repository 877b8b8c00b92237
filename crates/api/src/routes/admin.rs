//! Staff maintenance routes.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::post,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{ApiError, AppState, middleware::AuthActor};
use rentflow_db::OverdueRepository;

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/sweep-overdue", post(sweep_overdue))
}

/// Query parameters for a manual sweep.
#[derive(Debug, Deserialize)]
pub struct SweepQuery {
    /// Evaluation date. Defaults to today (UTC).
    pub today: Option<NaiveDate>,
}

/// POST `/admin/sweep-overdue` - Run the overdue sweep now.
async fn sweep_overdue(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    query: Result<Query<SweepQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    actor.require_staff("run the overdue sweep")?;

    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    let repo = OverdueRepository::new((*state.db).clone());
    let report = repo.sweep_overdue(today).await?;

    tracing::info!(
        triggered_by = %actor.id,
        %today,
        transitioned = report.transitioned,
        "Manual overdue sweep"
    );
    Ok(Json(json!({
        "ok": true,
        "today": today,
        "examined": report.examined,
        "updated_count": report.transitioned,
    })))
}
