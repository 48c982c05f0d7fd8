//! HTTP handlers. Each one delegates to the ingestion service or the reader.

pub mod health;
pub mod metrics;
pub mod orders;
