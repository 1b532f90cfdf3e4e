//! Vendor Analytics Pipeline - Batch Entrypoint
//!
//! One run: optional raw CSV ingestion, then aggregate -> clean -> persist
//! the vendor sales summary.

use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vendor_analytics_pipeline::config::Config;
use vendor_analytics_pipeline::services::{summary, IngestService, SummaryService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vendor_analytics_pipeline=debug,vsa_pipeline=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting vendor sales summary build");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let options = SqliteConnectOptions::from_str(&config.database.url)?.create_if_missing(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    tracing::info!("Database connection established");

    let started = Instant::now();
    let ingest = IngestService::new(db_pool.clone());

    // Load raw CSV tables when a data directory is configured
    if let Some(data_dir) = &config.ingest.data_dir {
        tracing::info!("Loading raw data from {}...", data_dir);
        let reports = ingest.load_raw_data(Path::new(data_dir)).await?;
        tracing::info!("Loaded {} raw tables", reports.len());
    }

    // Aggregate and clean
    tracing::info!("Creating vendor summary...");
    let summary_service = SummaryService::new(db_pool.clone());
    let rows = summary_service.build(config.summary.preview_rows).await?;

    // Persist the summary table
    tracing::info!("Ingesting {} rows into {}...", rows.len(), config.summary.table_name);
    let table = summary::to_table_data(&rows, &config.summary.table_name);
    ingest.write_table(&table).await?;

    // Optional CSV export for external tooling
    if let Some(export_path) = &config.summary.export_path {
        let csv_data = SummaryService::export_to_csv(&rows)?;
        std::fs::write(export_path, csv_data)?;
        tracing::info!("Exported summary to {}", export_path);
    }

    tracing::info!("Completed in {:.2?}", started.elapsed());

    Ok(())
}
