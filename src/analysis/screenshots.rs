//! Lookup of the per-cycle screenshots saved next to each series.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::market::DataType;
use crate::paths::DataLayout;

/// Names of per-cycle screenshot directories.
const TIMESTAMP_DIR_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}$";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenshotRef {
    pub timestamp: String,
    pub path: PathBuf,
}

/// Screenshots of `data_type` for `item`, newest first.
///
/// Both the `buy-c.png` spelling written by the sampler and the older
/// `buy_c.png` spelling are accepted.
pub fn list_screenshots(
    layout: &DataLayout,
    item: &str,
    data_type: DataType,
) -> Result<Vec<ScreenshotRef>> {
    let item_dir = layout.item_dir(item);
    if !item_dir.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = Regex::new(TIMESTAMP_DIR_PATTERN)?;
    let file_names = [
        format!("{}.png", data_type.region_tag()),
        format!("{}.png", data_type.tag()),
    ];

    let mut screenshots = Vec::new();
    let entries = fs::read_dir(&item_dir)
        .with_context(|| format!("Failed to list {}", item_dir.display()))?;
    for entry in entries.flatten() {
        let Ok(timestamp) = entry.file_name().into_string() else {
            continue;
        };
        if !pattern.is_match(&timestamp) || !entry.path().is_dir() {
            continue;
        }

        if let Some(path) = file_names
            .iter()
            .map(|name| entry.path().join(name))
            .find(|path| path.is_file())
        {
            screenshots.push(ScreenshotRef { timestamp, path });
        }
    }

    screenshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(screenshots)
}

/// Image bytes of the screenshot taken at `timestamp`, if any.
pub fn screenshot(
    layout: &DataLayout,
    item: &str,
    data_type: DataType,
    timestamp: &str,
) -> Result<Option<Vec<u8>>> {
    let Some(found) = list_screenshots(layout, item, data_type)?
        .into_iter()
        .find(|s| s.timestamp == timestamp)
    else {
        return Ok(None);
    };

    let bytes = fs::read(&found.path)
        .with_context(|| format!("Failed to read {}", found.path.display()))?;
    Ok(Some(bytes))
}
