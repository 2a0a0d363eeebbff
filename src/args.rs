use clap::ValueHint;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Samples trade-window prices with OCR")]
pub struct Cli {
    #[command(subcommand)]
    pub(crate) cmd: Command,

    /// Path to config.json (default: next to the executable)
    #[arg(long, value_hint = ValueHint::FilePath, env = "PRICE_SAMPLER_CONFIG", global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Log debug output, including rows dropped by the parser
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Sample the worklist forever, sleeping between passes
    Run,

    /// Sample the worklist once and exit
    Once,

    /// Print the sampled items as JSON
    Items,

    /// Print or save the price report of one item
    Report(ReportArgs),

    /// Copy the screenshot of one capture out of the data directory
    Screenshot(ScreenshotArgs),
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Item directory name
    pub(crate) item: String,

    /// Write the report here instead of stdout
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ScreenshotArgs {
    /// Item directory name
    pub(crate) item: String,

    /// Data type tag, e.g. `buy_c`
    pub(crate) data_type: String,

    /// Capture timestamp, e.g. `2024-01-01_10-00`
    pub(crate) timestamp: String,

    /// Destination PNG file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub(crate) out: PathBuf,
}
