//! Configuration management for the Vendor Analytics Pipeline
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with VSA_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Raw CSV ingestion configuration
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Summary build configuration
    pub summary: SummaryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IngestConfig {
    /// Directory of raw CSV files to load before the summary build.
    /// Ingestion is skipped when unset.
    pub data_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummaryConfig {
    /// Name of the persisted summary table
    pub table_name: String,

    /// Number of rows logged as a preview after each stage
    pub preview_rows: usize,

    /// Optional path for a CSV export of the cleaned summary
    #[serde(default)]
    pub export_path: Option<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("VSA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("database.url", "sqlite://inventory.db")?
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 1)?
            .set_default("summary.table_name", "vendor_sales_summary")?
            .set_default("summary.preview_rows", 5)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (VSA_ prefix)
            .add_source(
                Environment::with_prefix("VSA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
