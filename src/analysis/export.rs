//! JSON export of an item's price history.

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::screenshots::list_screenshots;
use super::series::{data_types_for_item, price_series, PricePoint, PriceSeries};
use super::statistics::RatioStats;
use crate::market::NameMapping;
use crate::paths::DataLayout;

/// Everything known about one data type of an item.
#[derive(Debug, Clone, Serialize)]
pub struct DataTypeReport {
    /// File tag, e.g. `buy_c`
    pub data_type: String,
    pub label: String,
    pub currency_display_name: String,
    pub series: PriceSeries,
    pub latest: Option<PricePoint>,
    pub stats: Option<RatioStats>,
    /// Newest first
    pub screenshot_timestamps: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub item: String,
    pub display_name: String,
    pub generated_at: String,
    pub data_types: Vec<DataTypeReport>,
}

/// Collects series, statistics, and screenshot timestamps for `item`.
pub fn build_item_report(layout: &DataLayout, names: &NameMapping, item: &str) -> Result<ItemReport> {
    let mut data_types = Vec::new();

    for data_type in data_types_for_item(layout, item) {
        let series = price_series(layout, item, data_type);
        let screenshot_timestamps = list_screenshots(layout, item, data_type)?
            .into_iter()
            .map(|s| s.timestamp)
            .collect();

        data_types.push(DataTypeReport {
            data_type: data_type.tag(),
            label: data_type.label(),
            currency_display_name: names
                .currency_display_name(data_type.currency.key())
                .to_string(),
            latest: series.latest().cloned(),
            stats: RatioStats::from_series(&series),
            series,
            screenshot_timestamps,
        });
    }

    Ok(ItemReport {
        item: item.to_string(),
        display_name: names.item_display_name(item).to_string(),
        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        data_types,
    })
}

/// Export a report to a JSON file.
///
/// The output is pretty-printed for human readability.
pub fn export_to_json(report: &ItemReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;

    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{CurrencyKind, DataType, PriceRecord, Side};
    use crate::storage::timeseries;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_build_and_export_report() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path().join("data"));
        let buy_d = DataType::new(Side::Buy, CurrencyKind::Divine);
        let path = layout.results_file("divi", buy_d);
        timeseries::append_at(
            &path,
            vec![PriceRecord::parse("1:5", "10").unwrap()],
            "2024-01-01_10-00",
        )
        .unwrap();
        timeseries::append_at(&path, vec![], "2024-01-01_10-10").unwrap();
        let shot_dir = layout.screenshot_dir("divi", "2024-01-01_10-00");
        fs::create_dir_all(&shot_dir).unwrap();
        fs::write(shot_dir.join("buy-d.png"), b"png").unwrap();

        let names = NameMapping {
            items: HashMap::from([("divi".to_string(), "神圣石".to_string())]),
            currencies: HashMap::from([("divine".to_string(), "神圣石".to_string())]),
        };

        let report = build_item_report(&layout, &names, "divi").unwrap();
        assert_eq!(report.display_name, "神圣石");
        assert_eq!(report.data_types.len(), 1);
        let buy = &report.data_types[0];
        assert_eq!(buy.data_type, "buy_d");
        assert_eq!(buy.latest.as_ref().unwrap().timestamp, "2024-01-01_10-00");
        assert_eq!(buy.series.empty_timestamps, vec!["2024-01-01_10-10"]);
        assert_eq!(buy.stats.as_ref().unwrap().count, 1);
        assert_eq!(buy.screenshot_timestamps, vec!["2024-01-01_10-00"]);

        let out = dir.path().join("report.json");
        export_to_json(&report, &out).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        assert!(content.contains("\"item\": \"divi\""));
        assert!(content.contains("\"raw_ratio\": \"1:5\""));
        assert!(content.contains("神圣石"));
    }

    #[test]
    fn test_report_for_unknown_item_is_empty() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let report = build_item_report(&layout, &NameMapping::default(), "ghost").unwrap();
        assert_eq!(report.display_name, "ghost");
        assert!(report.data_types.is_empty());
    }
}
