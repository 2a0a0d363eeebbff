//! Read-only views over the stored price series.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs;

use crate::market::{DataType, NameMapping, PriceRecord};
use crate::paths::DataLayout;
use crate::storage::timeseries::{self, TIMESTAMP_FORMAT};

/// An item directory and its display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemListing {
    pub name: String,
    pub display_name: String,
}

/// One capture that produced at least one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub timestamp: String,
    pub records: Vec<PriceRecord>,
}

impl PricePoint {
    /// The top row of the panel, used as the headline price.
    pub fn first(&self) -> Option<&PriceRecord> {
        self.records.first()
    }
}

/// A series split into captures with records and captures without.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    /// Sorted by timestamp, oldest first
    pub points: Vec<PricePoint>,
    /// Captures that read no rows, sorted oldest first
    pub empty_timestamps: Vec<String>,
}

impl PriceSeries {
    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Headline ratio of every point, oldest first.
    pub fn headline_ratios(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter_map(|p| p.first().map(PriceRecord::ratio))
            .collect()
    }
}

/// Lists item directories under the data root, sorted by display name.
pub fn list_items(layout: &DataLayout, names: &NameMapping) -> Vec<ItemListing> {
    let Ok(entries) = fs::read_dir(layout.base()) else {
        return Vec::new();
    };

    let mut items: Vec<ItemListing> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .map(|name| ItemListing {
            display_name: names.item_display_name(&name).to_string(),
            name,
        })
        .collect();

    items.sort_by(|a, b| {
        a.display_name
            .cmp(&b.display_name)
            .then_with(|| a.name.cmp(&b.name))
    });
    items
}

/// Data types that have a series file for `item`.
pub fn data_types_for_item(layout: &DataLayout, item: &str) -> Vec<DataType> {
    DataType::ALL
        .into_iter()
        .filter(|dt| layout.results_file(item, *dt).is_file())
        .collect()
}

/// Loads one series and splits it into points and empty captures.
pub fn price_series(layout: &DataLayout, item: &str, data_type: DataType) -> PriceSeries {
    let mut series = PriceSeries::default();

    for entry in timeseries::read(&layout.results_file(item, data_type)) {
        if !entry.data.is_empty() {
            series.points.push(PricePoint {
                timestamp: entry.timestamp,
                records: entry.data,
            });
        } else if !entry.timestamp.is_empty() {
            series.empty_timestamps.push(entry.timestamp);
        }
    }

    // Stable: same-bucket captures keep their append order
    series.points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    series.empty_timestamps.sort();
    series
}

/// `2024-01-01_10-00` → `2024-01-01 10:00`. Other text is returned unchanged.
pub fn format_timestamp(value: &str) -> String {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| value.to_string())
}
