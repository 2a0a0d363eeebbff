//! Capture session state machine: one sampling cycle for one (item, currency).
//!
//! The session sequences through: Position → Search item → Search currency →
//! Render → Capture → Extract → Persist → Clean up. Each `step()` performs one
//! state's UI actions or file work and advances to the next state.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::fs;

use super::config::{SamplerConfig, WorkItem};
use super::desktop::{hold_key, hotkey, move_and_click, pause, Desktop, Key};
use crate::market::{DataType, ParsedRows, RawRow, Side};
use crate::ocr::{read_price_region, TextRecognizer};
use crate::paths::DataLayout;
use crate::storage::{self, timeseries};

/// Capture session states.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    /// Waiting for the operator, then focusing the "needed" field
    PositioningUi,
    /// Typing the item name into the search box
    SearchingItem,
    /// Focusing the "owned" field and typing the currency name
    SearchingCurrency,
    /// Hovering the price anchor and waiting for the panel to refresh
    AwaitingRender,
    /// Grabbing both price regions with Alt held
    Capturing,
    /// Running OCR on the captured regions
    Extracting,
    /// Appending records to the series files
    Persisting,
    /// Pruning old screenshot directories
    CleaningUp,
    /// Cycle complete
    Done,
    /// Cycle aborted
    Failed(String),
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::PositioningUi => write!(f, "Positioning UI"),
            CaptureState::SearchingItem => write!(f, "Searching item"),
            CaptureState::SearchingCurrency => write!(f, "Searching currency"),
            CaptureState::AwaitingRender => write!(f, "Awaiting render"),
            CaptureState::Capturing => write!(f, "Capturing"),
            CaptureState::Extracting => write!(f, "Extracting"),
            CaptureState::Persisting => write!(f, "Persisting"),
            CaptureState::CleaningUp => write!(f, "Cleaning up"),
            CaptureState::Done => write!(f, "Done"),
            CaptureState::Failed(msg) => write!(f, "Failed: {}", msg),
        }
    }
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub item: String,
    pub bucket: String,
    pub buy_records: usize,
    pub sell_records: usize,
    pub empty_rows: usize,
    pub dropped_rows: usize,
    pub pruned_dirs: usize,
}

/// Region images and their OCR results, keyed by side.
struct RegionCapture {
    data_type: DataType,
    image: RgbaImage,
    parsed: Option<ParsedRows>,
}

pub struct CaptureSession<'a> {
    state: CaptureState,
    work: WorkItem,
    /// Resolved when capturing starts unless pinned; shared by the screenshot
    /// directory and both appends
    bucket: Option<String>,
    config: &'a SamplerConfig,
    layout: &'a DataLayout,
    desktop: &'a dyn Desktop,
    recognizer: &'a dyn TextRecognizer,
    regions: Vec<RegionCapture>,
    report: CycleReport,
}

impl<'a> CaptureSession<'a> {
    /// Creates a session stamped with the time bucket current at capture.
    pub fn new(
        work: WorkItem,
        config: &'a SamplerConfig,
        layout: &'a DataLayout,
        desktop: &'a dyn Desktop,
        recognizer: &'a dyn TextRecognizer,
    ) -> Self {
        let report = CycleReport {
            item: work.item.clone(),
            ..Default::default()
        };
        Self {
            state: CaptureState::PositioningUi,
            work,
            bucket: None,
            config,
            layout,
            desktop,
            recognizer,
            regions: Vec::with_capacity(2),
            report,
        }
    }

    /// Creates a session whose files are stored under `bucket`.
    pub fn with_bucket(
        work: WorkItem,
        bucket: String,
        config: &'a SamplerConfig,
        layout: &'a DataLayout,
        desktop: &'a dyn Desktop,
        recognizer: &'a dyn TextRecognizer,
    ) -> Self {
        let mut session = Self::new(work, config, layout, desktop, recognizer);
        session.bucket = Some(bucket);
        session
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// `None` until the session reaches `Capturing`, unless pinned.
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Runs every state until the cycle is done.
    ///
    /// The session stays inspectable afterwards; on error `state()` is `Failed`.
    pub fn run(&mut self) -> Result<CycleReport> {
        while self.step()? {}
        Ok(std::mem::take(&mut self.report))
    }

    /// Advances the state machine by one step.
    ///
    /// Returns `Ok(true)` if the cycle should continue, `Ok(false)` once it is
    /// done. On error the session moves to `Failed` and the error is returned.
    pub fn step(&mut self) -> Result<bool> {
        match self.advance() {
            Ok(more) => Ok(more),
            Err(e) => {
                log::error!(
                    "[{} / {} @ {}] {} failed: {:#}",
                    self.work.item,
                    self.work.currency,
                    self.bucket().unwrap_or("no bucket yet"),
                    self.state,
                    e
                );
                self.state = CaptureState::Failed(format!("{:#}", e));
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> Result<bool> {
        let timing = &self.config.timing;
        let ui = &self.config.layout;

        match &self.state {
            CaptureState::PositioningUi => {
                log::info!("Sampling {} in {}", self.work.item, self.work.currency);
                pause(timing.startup_delay());
                move_and_click(self.desktop, ui.needed_field)?;
                pause(timing.action_pause());
                self.state = CaptureState::SearchingItem;
            }

            CaptureState::SearchingItem => {
                self.search(&self.work.item)?;
                self.state = CaptureState::SearchingCurrency;
            }

            CaptureState::SearchingCurrency => {
                move_and_click(self.desktop, ui.owned_field)?;
                pause(timing.action_pause());
                let text = self.config.currency_search.text_for(self.work.currency);
                self.search(text)?;
                self.state = CaptureState::AwaitingRender;
            }

            CaptureState::AwaitingRender => {
                self.desktop.move_cursor(ui.hover_away)?;
                pause(timing.action_pause());
                pause(timing.render_delay());
                self.desktop.move_cursor(ui.price_anchor)?;
                pause(timing.action_pause());
                self.state = CaptureState::Capturing;
            }

            CaptureState::Capturing => {
                let bucket = self
                    .bucket
                    .get_or_insert_with(timeseries::current_bucket)
                    .clone();
                self.report.bucket = bucket.clone();

                let (buy, sell) = {
                    let _alt = hold_key(self.desktop, Key::Alt)?;
                    pause(timing.action_pause());
                    let buy = self.desktop.capture_region(&ui.buy_region)?;
                    let sell = self.desktop.capture_region(&ui.sell_region)?;
                    (buy, sell)
                };

                let dir = self.layout.screenshot_dir(&self.work.item, &bucket);
                fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;

                for (side, image) in [(Side::Buy, buy), (Side::Sell, sell)] {
                    let data_type = DataType::new(side, self.work.currency);
                    let path = self
                        .layout
                        .screenshot_file(&self.work.item, &bucket, data_type);
                    image
                        .save(&path)
                        .with_context(|| format!("Failed to save {}", path.display()))?;
                    log::debug!("Screenshot saved to {}", path.display());
                    self.regions.push(RegionCapture {
                        data_type,
                        image,
                        parsed: None,
                    });
                }
                self.state = CaptureState::Extracting;
            }

            CaptureState::Extracting => {
                for region in &mut self.regions {
                    let (rows, parsed) =
                        read_price_region(&region.image, self.recognizer, self.config.ocr_threshold);
                    log_rows(&self.work.item, region.data_type, &rows);
                    log::info!(
                        "[{} / {}] {} records, {} empty rows, {} dropped",
                        self.work.item,
                        region.data_type,
                        parsed.records.len(),
                        parsed.empty_rows,
                        parsed.dropped_rows
                    );
                    self.report.empty_rows += parsed.empty_rows;
                    self.report.dropped_rows += parsed.dropped_rows;
                    region.parsed = Some(parsed);
                }
                self.state = CaptureState::Persisting;
            }

            CaptureState::Persisting => {
                let bucket = self.report.bucket.clone();
                for region in &mut self.regions {
                    let records = region.parsed.take().map(|p| p.records).unwrap_or_default();
                    let count = records.len();
                    match region.data_type.side {
                        Side::Buy => self.report.buy_records = count,
                        Side::Sell => self.report.sell_records = count,
                    }

                    let path = self.layout.results_file(&self.work.item, region.data_type);
                    let entries = timeseries::append_at(&path, records, &bucket)
                        .with_context(|| format!("Failed to append to {}", path.display()))?;
                    log::info!(
                        "[{} / {}] {} entries in {}",
                        self.work.item,
                        region.data_type,
                        entries,
                        path.display()
                    );
                }
                self.regions.clear();
                self.state = CaptureState::CleaningUp;
            }

            CaptureState::CleaningUp => {
                let item_dir = self.layout.item_dir(&self.work.item);
                match storage::prune(&item_dir, self.config.retention_count) {
                    Ok(pruned) => self.report.pruned_dirs = pruned.removed.len(),
                    Err(e) => log::warn!("Skipping cleanup of {}: {:#}", item_dir.display(), e),
                }
                self.state = CaptureState::Done;
            }

            CaptureState::Done | CaptureState::Failed(_) => return Ok(false),
        }

        Ok(true)
    }

    /// Ctrl+F, paste `text`, confirm.
    fn search(&self, text: &str) -> Result<()> {
        let pause_time = self.config.timing.action_pause();

        hotkey(self.desktop, &[Key::Control, Key::F])?;
        pause(pause_time);
        self.desktop.set_clipboard(text)?;
        hotkey(self.desktop, &[Key::Control, Key::V])?;
        pause(pause_time);
        move_and_click(self.desktop, self.config.layout.confirm_button)?;
        pause(pause_time);
        Ok(())
    }

}

fn log_rows(item: &str, data_type: DataType, rows: &[RawRow]) {
    for (i, row) in rows.iter().enumerate() {
        log::info!(
            "[{} / {}] row {}: ratio '{}' count '{}'",
            item,
            data_type,
            i + 1,
            row.ratio_text,
            row.count_text
        );
    }
}
