//! Shared types and domain rules for the Vendor Analytics Pipeline
//!
//! This crate contains the output row model and the business-metric math used
//! by the batch pipeline. It deliberately has no database dependency so the
//! metric policies can be tested in isolation.

pub mod metrics;
pub mod models;

pub use metrics::*;
pub use models::*;
