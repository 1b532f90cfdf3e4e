//! Batch pipeline services

pub mod ingest;
pub mod summary;

pub use ingest::IngestService;
pub use summary::SummaryService;
