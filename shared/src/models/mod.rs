//! Domain models for the Vendor Analytics Pipeline

mod summary;

pub use summary::*;
