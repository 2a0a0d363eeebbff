//! Read projections over the stored data, for dashboards and reports.
//!
//! This module provides:
//! - Item listing with display names
//! - Per data type price series, split into points and empty captures
//! - Screenshot lookup by timestamp
//! - Headline ratio statistics
//! - JSON export of an item report

pub mod export;
pub mod screenshots;
pub mod series;
pub mod statistics;

pub use export::{build_item_report, export_to_json, DataTypeReport, ItemReport};
pub use screenshots::{list_screenshots, screenshot, ScreenshotRef};
pub use series::{
    data_types_for_item, format_timestamp, list_items, price_series, ItemListing, PricePoint,
    PriceSeries,
};
pub use statistics::RatioStats;
