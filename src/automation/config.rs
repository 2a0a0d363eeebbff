//! Configuration types for the sampler.
//!
//! Loads settings from config.json at startup. Provides screen coordinates,
//! the worklist, and timing parameters. Missing fields take their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::market::CurrencyKind;

/// A point in absolute screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in absolute screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRect {
    /// X position of top-left corner
    pub x: i32,
    /// Y position of top-left corner
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One (item, currency) pair sampled every pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Item key, also the search text and the data directory name
    pub item: String,
    pub currency: CurrencyKind,
}

impl WorkItem {
    pub fn new(item: impl Into<String>, currency: CurrencyKind) -> Self {
        Self {
            item: item.into(),
            currency,
        }
    }
}

/// Text typed into the in-game search box to select each currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencySearch {
    pub chaos: String,
    pub divine: String,
}

impl CurrencySearch {
    pub fn text_for(&self, currency: CurrencyKind) -> &str {
        match currency {
            CurrencyKind::Chaos => &self.chaos,
            CurrencyKind::Divine => &self.divine,
        }
    }
}

impl Default for CurrencySearch {
    fn default() -> Self {
        Self {
            chaos: "混沌石".to_string(),
            divine: "神圣石".to_string(),
        }
    }
}

/// Fixed positions of the trade window at the expected resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiLayout {
    /// The "I want" currency field
    pub needed_field: ScreenPoint,
    /// The "I have" currency field
    pub owned_field: ScreenPoint,
    /// Confirms a search selection
    pub confirm_button: ScreenPoint,
    /// Hovering here shows the price panel
    pub price_anchor: ScreenPoint,
    /// Neutral spot to clear stale tooltips
    pub hover_away: ScreenPoint,
    pub buy_region: ScreenRect,
    pub sell_region: ScreenRect,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            needed_field: ScreenPoint::new(572, 335),
            owned_field: ScreenPoint::new(1178, 335),
            confirm_button: ScreenPoint::new(950, 281),
            price_anchor: ScreenPoint::new(867, 261),
            hover_away: ScreenPoint::new(1067, 260),
            buy_region: ScreenRect::new(743, 362, 247, 178),
            sell_region: ScreenRect::new(745, 606, 249, 170),
        }
    }
}

/// Delays around UI actions (milliseconds).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait before the first action of each cycle
    pub startup_delay_ms: u64,
    /// Pause after every click, key press, or paste
    pub action_pause_ms: u64,
    /// Wait for the price panel to refresh before capturing
    pub render_delay_ms: u64,
}

impl TimingConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn action_pause(&self) -> Duration {
        Duration::from_millis(self.action_pause_ms)
    }

    pub fn render_delay(&self) -> Duration {
        Duration::from_millis(self.render_delay_ms)
    }

    /// No waiting at all. Used by tests.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            startup_delay_ms: 0,
            action_pause_ms: 0,
            render_delay_ms: 0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: 3000,
            action_pause_ms: 500,
            render_delay_ms: 1000,
        }
    }
}

/// Complete sampler configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Root of the per-item data directories
    pub data_dir: PathBuf,
    pub name_mapping_path: PathBuf,
    /// Sleep between passes over the worklist
    pub interval_secs: u64,
    /// Screenshot directories kept per item
    pub retention_count: usize,
    /// OCR binarization threshold (pixels above become background)
    pub ocr_threshold: u8,
    pub worklist: Vec<WorkItem>,
    pub currency_search: CurrencySearch,
    pub layout: UiLayout,
    pub timing: TimingConfig,
    /// Explicit Tesseract executable, searched for when absent
    pub tesseract_path: Option<PathBuf>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Market price statistics"),
            name_mapping_path: PathBuf::from("name_mapping.json"),
            interval_secs: 600,
            retention_count: crate::storage::DEFAULT_KEEP,
            ocr_threshold: crate::ocr::DEFAULT_THRESHOLD,
            worklist: vec![
                WorkItem::new("divi", CurrencyKind::Chaos),
                WorkItem::new("Deafening Essence of Hatred", CurrencyKind::Chaos),
                WorkItem::new("Deafening Essence of Hatred", CurrencyKind::Divine),
            ],
            currency_search: CurrencySearch::default(),
            layout: UiLayout::default(),
            timing: TimingConfig::default(),
            tesseract_path: None,
        }
    }
}

impl SamplerConfig {
    /// Loads configuration from `path`, or returns defaults if it is missing or invalid.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn load(path: &Path) -> Self {
        log::info!("Looking for config at: {}", path.display());

        let mut config = if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str(&contents) {
                    Ok(config) => {
                        log::info!("Config loaded from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            }
        } else {
            log::info!("{} not found. Using default config.", path.display());
            Self::default()
        };

        if let Some(dir) = path.parent() {
            config.resolve_relative_to(dir);
        }
        config
    }

    /// Makes relative paths absolute with respect to `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.data_dir);
        resolve(&mut self.name_mapping_path);
        if let Some(p) = self.tesseract_path.as_mut() {
            resolve(p);
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
