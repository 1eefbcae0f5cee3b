//! ReviewFlow Reconciler
//!
//! Periodic idempotent job over the review store:
//! 1. Scans for active reviews past their due date (the derived "late"
//!    view; nothing is written back to the reviews)
//! 2. Publishes the overdue gauge for dashboards
//! 3. Sends fire-and-forget overdue notifications

mod processor;

use crate::processor::OverdueProcessor;
use reviewflow_common::{
    config::AppConfig,
    db::{DbPool, Repository},
    metrics::register_metrics,
    notify::create_notifier,
    VERSION,
};
use std::net::SocketAddr;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting ReviewFlow Reconciler v{}", VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    // Initialize metrics exporter
    register_metrics();
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("Prometheus exporter listening on {}", addr);
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db);

    let notifier = create_notifier(&config.notification);
    let processor = OverdueProcessor::new(repo, notifier, config.reconciler.scan_batch_size);

    let mut ticker = tokio::time::interval(config.scan_interval());
    info!(
        interval_secs = config.reconciler.scan_interval_secs,
        "Reconciler ready, starting scan loop..."
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = processor.run_scan().await {
                    error!(error = %e, "Overdue scan failed");
                }
            }
        }
    }

    info!("Reconciler shutting down");
    Ok(())
}
