//! Vendor Analytics Pipeline
//!
//! A batch pipeline over a SQLite inventory database: optionally ingests raw
//! CSV files as tables, aggregates purchases, sales, and freight into a
//! per-vendor, per-brand summary, derives business ratios, and persists the
//! result as the `vendor_sales_summary` table.

pub mod config;
pub mod error;
pub mod services;

pub use config::Config;
