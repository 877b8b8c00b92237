//! Background jobs run by the server process.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use rentflow_core::overdue::SweepReport;
use rentflow_db::OverdueRepository;
use rentflow_shared::config::SweeperConfig;

/// Runs one sweep, logging instead of returning failures.
pub async fn run_sweep_once(repo: &OverdueRepository, today: NaiveDate) -> Option<SweepReport> {
    match repo.sweep_overdue(today).await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!(error = %e, %today, "Overdue sweep failed");
            None
        }
    }
}

/// Spawns the periodic overdue sweep.
///
/// The first sweep runs immediately. The task stops when `shutdown`
/// flips to `true` or its sender is dropped. Returns `None` when the
/// sweeper is disabled.
pub fn spawn_overdue_sweeper(
    db: DatabaseConnection,
    config: &SweeperConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Option<JoinHandle<()>> {
    if !config.enabled {
        tracing::info!("Overdue sweeper disabled");
        return None;
    }

    let period = Duration::from_secs(config.interval_secs.max(1));
    tracing::info!(interval_secs = period.as_secs(), "Overdue sweeper started");

    Some(tokio::spawn(async move {
        let repo = OverdueRepository::new(db);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    run_sweep_once(&repo, Utc::now().date_naive()).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Overdue sweeper stopped");
    }))
}
