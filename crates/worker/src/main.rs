use std::sync::Arc;

use vigil_common::config::AppConfig;
use vigil_common::db;
use vigil_engine::store::{AlertStore, PgStore};
use vigil_push::PushTransport;
use vigil_push::fcm::FcmClient;
use vigil_worker::cleanup::QueueCleanup;
use vigil_worker::poller::QueueWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil_worker=info,vigil_engine=debug".into()),
        )
        .json()
        .init();

    tracing::info!("Vigil queue worker starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let store: Arc<dyn AlertStore> = Arc::new(PgStore::new(pool));
    let push: Arc<dyn PushTransport> = Arc::new(FcmClient::new(
        config.push_gateway_url.clone(),
        config.push_server_key.clone(),
    )?);

    let worker = QueueWorker::new(
        store.clone(),
        push,
        config.queue_poll_interval_ms,
        config.queue_batch_size,
    );
    let cleanup = QueueCleanup::new(store);

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        _ = worker.run() => {}
        _ = cleanup.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("Vigil queue worker stopped.");
    Ok(())
}
