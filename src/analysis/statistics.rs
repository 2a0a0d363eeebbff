//! Summary statistics over a series' headline ratios.
//!
//! Calculates count, mean, median, min, max, standard deviation, and quartiles.

use serde::Serialize;

use super::series::PriceSeries;

/// Statistics of the headline (top-row) ratio across a series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatioStats {
    /// Number of captures with a headline record
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Standard deviation (population)
    pub std_dev: f64,
    /// First quartile (25th percentile)
    pub quartile_1: f64,
    /// Third quartile (75th percentile)
    pub quartile_3: f64,
}

impl RatioStats {
    /// Returns `None` for a series without records.
    pub fn from_series(series: &PriceSeries) -> Option<Self> {
        calculate_ratio_stats(&series.headline_ratios())
    }
}

fn calculate_ratio_stats(values: &[f64]) -> Option<RatioStats> {
    if values.is_empty() {
        return None;
    }

    let count = values.len();

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = values.iter().sum::<f64>() / count as f64;

    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / count as f64;

    Some(RatioStats {
        count,
        mean,
        median: calculate_percentile(&sorted, 50.0),
        min: sorted[0],
        max: sorted[count - 1],
        std_dev: variance.sqrt(),
        quartile_1: calculate_percentile(&sorted, 25.0),
        quartile_3: calculate_percentile(&sorted, 75.0),
    })
}

/// Calculate percentile using linear interpolation.
fn calculate_percentile(sorted: &[f64], percentile: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }

    // Index in range [0, n-1]
    let index = (percentile / 100.0) * (n - 1) as f64;
    let lower_idx = index.floor() as usize;
    let upper_idx = index.ceil() as usize;

    let lower = sorted[lower_idx];
    let upper = sorted[upper_idx];
    lower + (upper - lower) * index.fract()
}
