//! Persistence for sampled prices and their screenshots.
//!
//! This module provides:
//! - Append-only JSON time series with 10-minute timestamp buckets
//! - Retention of the most recent screenshot directories per item

pub mod retention;
pub mod timeseries;

pub use retention::{prune, PruneReport, DEFAULT_KEEP};
pub use timeseries::{append, append_at, bucket_timestamp, current_bucket, read, SampleEntry};
