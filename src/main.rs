//! Command-line entry point for the price sampler.

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use price_sampler::automation::{Desktop, SamplerConfig, Scheduler};
use price_sampler::market::{DataType, NameMapping};
use price_sampler::paths::{self, DataLayout};
use price_sampler::{analysis, logging, ocr};

use crate::args::{Cli, Command, ReportArgs, ScreenshotArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(paths::get_default_config_path);
    let config = SamplerConfig::load(&config_path);

    match cli.cmd {
        Command::Run => sample(&config, false),
        Command::Once => sample(&config, true),
        Command::Items => print_items(&config),
        Command::Report(args) => report(&config, &args),
        Command::Screenshot(args) => export_screenshot(&config, &args),
    }
}

/// Runs the scheduler against the real desktop.
fn sample(config: &SamplerConfig, once: bool) -> Result<()> {
    let recognizer = ocr::ensure_tesseract(config.tesseract_path.as_deref())
        .context("Tesseract is required for sampling")?;
    let desktop = platform_desktop()?;
    let scheduler = Scheduler::new(config, desktop.as_ref(), &recognizer);

    log::info!("Data directory: {}", config.data_dir.display());

    if once {
        let report = scheduler.run_pass()?;
        for (work, error) in &report.failed {
            log::warn!("{} / {} failed: {}", work.item, work.currency, error);
        }
        Ok(())
    } else {
        scheduler.run_forever()
    }
}

#[cfg(windows)]
fn platform_desktop() -> Result<Box<dyn Desktop>> {
    Ok(Box::new(price_sampler::automation::WindowsDesktop::new()))
}

#[cfg(not(windows))]
fn platform_desktop() -> Result<Box<dyn Desktop>> {
    anyhow::bail!("Screen sampling is only supported on Windows")
}

fn print_items(config: &SamplerConfig) -> Result<()> {
    let names = NameMapping::load(&config.name_mapping_path);
    let layout = DataLayout::new(&config.data_dir);
    let items = analysis::list_items(&layout, &names);

    println!(
        "{}",
        serde_json::to_string_pretty(&items).context("Failed to serialize item list")?
    );
    Ok(())
}

fn report(config: &SamplerConfig, args: &ReportArgs) -> Result<()> {
    let names = NameMapping::load(&config.name_mapping_path);
    let layout = DataLayout::new(&config.data_dir);
    let report = analysis::build_item_report(&layout, &names, &args.item)?;

    for data_type in &report.data_types {
        let latest = data_type
            .latest
            .as_ref()
            .map(|p| analysis::format_timestamp(&p.timestamp))
            .unwrap_or_else(|| "never".to_string());
        log::info!(
            "{} {}: {} points, latest {}",
            report.display_name,
            data_type.label,
            data_type.series.points.len(),
            latest
        );
    }

    match &args.out {
        Some(path) => {
            analysis::export_to_json(&report, path)?;
            log::info!("Report saved: {}", path.display());
        }
        None => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        ),
    }
    Ok(())
}

fn export_screenshot(config: &SamplerConfig, args: &ScreenshotArgs) -> Result<()> {
    let data_type = DataType::from_tag(&args.data_type)
        .with_context(|| format!("Unknown data type: {}", args.data_type))?;
    let layout = DataLayout::new(&config.data_dir);

    let bytes = analysis::screenshot(&layout, &args.item, data_type, &args.timestamp)?
        .with_context(|| {
            format!(
                "No {} screenshot of {} at {}",
                data_type, args.item, args.timestamp
            )
        })?;
    std::fs::write(&args.out, bytes)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    log::info!("Screenshot saved: {}", args.out.display());
    Ok(())
}
