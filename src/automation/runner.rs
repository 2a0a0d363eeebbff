//! Scheduler - main loop over the worklist.
//!
//! Runs one capture session per work item, sequentially, then sleeps until the
//! next pass. A failed cycle is logged and skipped unless the failure means the
//! desktop cannot be captured at all.

use anyhow::Result;
use std::time::Instant;

use super::config::{SamplerConfig, WorkItem};
use super::desktop::{pause, Desktop, DesktopError};
use super::session::{CaptureSession, CycleReport};
use crate::ocr::TextRecognizer;
use crate::paths::DataLayout;

/// Outcome of one pass over the worklist.
#[derive(Debug, Default)]
pub struct PassReport {
    pub completed: Vec<CycleReport>,
    /// Work items whose cycle failed, with the error message
    pub failed: Vec<(WorkItem, String)>,
}

pub struct Scheduler<'a> {
    config: &'a SamplerConfig,
    layout: DataLayout,
    desktop: &'a dyn Desktop,
    recognizer: &'a dyn TextRecognizer,
}

/// Whether an error from a cycle should stop the scheduler.
pub fn is_fatal(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<DesktopError>()
        .is_some_and(DesktopError::is_fatal)
}

impl<'a> Scheduler<'a> {
    pub fn new(
        config: &'a SamplerConfig,
        desktop: &'a dyn Desktop,
        recognizer: &'a dyn TextRecognizer,
    ) -> Self {
        Self {
            config,
            layout: DataLayout::new(&config.data_dir),
            desktop,
            recognizer,
        }
    }

    /// Samples every work item once.
    ///
    /// Returns an error only for fatal failures; the remaining items of the pass
    /// are skipped in that case.
    pub fn run_pass(&self) -> Result<PassReport> {
        let mut report = PassReport::default();
        let start = Instant::now();

        for work in &self.config.worklist {
            let mut session = CaptureSession::new(
                work.clone(),
                self.config,
                &self.layout,
                self.desktop,
                self.recognizer,
            );

            let result = session.run();
            log::debug!("{} / {}: {}", work.item, work.currency, session.state());

            match result {
                Ok(cycle) => report.completed.push(cycle),
                Err(e) if is_fatal(&e) => {
                    log::error!(
                        "Stopping: {} / {} hit a fatal error: {:#}",
                        work.item,
                        work.currency,
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    log::warn!(
                        "Cycle for {} / {} (bucket {}) failed, continuing: {:#}",
                        work.item,
                        work.currency,
                        session.bucket().unwrap_or("none"),
                        e
                    );
                    report.failed.push((work.clone(), format!("{:#}", e)));
                }
            }
        }

        log::info!(
            "Pass complete: {} ok, {} failed in {:.1}s",
            report.completed.len(),
            report.failed.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(report)
    }

    /// Runs passes forever, sleeping `interval_secs` between them.
    ///
    /// Only returns on a fatal error.
    pub fn run_forever(&self) -> Result<()> {
        log::info!(
            "Sampling {} work items every {}s",
            self.config.worklist.len(),
            self.config.interval_secs
        );

        loop {
            self.run_pass()?;
            log::info!("Next pass in {}s", self.config.interval_secs);
            pause(self.config.interval());
        }
    }
}
