//! Rentflow API Server
//!
//! Main entry point for the Rentflow backend service.

use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use rentflow_api::{AppState, create_router, jobs};
use rentflow_core::webhook::WebhookVerifier;
use rentflow_db::{connect, migration::Migrator};
use rentflow_shared::config::LogConfig;
use rentflow_shared::{AppConfig, EmailNotifier, JwtService, LogNotifier, Notifier};

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rentflow=debug,tower_http=debug".into());
    let fmt_layer = if log.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn build_notifier(config: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match &config.email {
        Some(email) => {
            let notifier = EmailNotifier::new(email).context("Failed to configure SMTP")?;
            info!(
                smtp_host = %email.smtp_host,
                smtp_port = %email.smtp_port,
                "Email notifications configured"
            );
            Ok(Arc::new(notifier))
        }
        None => {
            info!("No SMTP settings; notifications are logged only");
            Ok(Arc::new(LogNotifier))
        }
    }
}

async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    let _ = shutdown.send(true);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    if config.database.run_migrations {
        Migrator::up(&db, None)
            .await
            .context("Failed to apply migrations")?;
        info!("Migrations applied");
    }

    let webhook_verifier = WebhookVerifier::from_config(&config.webhooks);
    info!(
        providers = config.webhooks.providers.len(),
        "Webhook providers configured"
    );

    let state = AppState {
        db: Arc::new(db.clone()),
        jwt_service: Arc::new(JwtService::new(&config.jwt)),
        webhook_verifier: Arc::new(webhook_verifier),
        notifier: build_notifier(&config)?,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = jobs::spawn_overdue_sweeper(db, &config.sweeper, shutdown_rx);

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }
    info!("Server stopped");

    Ok(())
}
