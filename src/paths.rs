use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::market::DataType;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the default config file: `<exe_dir>/config.json`
pub fn get_default_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// On-disk layout of the sampled data.
///
/// ```text
/// <base>/<item>/<data-type>_results.json
/// <base>/<item>/<YYYY-MM-DD_HH-MM>/<region-tag>.png
/// ```
#[derive(Debug, Clone)]
pub struct DataLayout {
    base: PathBuf,
}

impl DataLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn item_dir(&self, item: &str) -> PathBuf {
        self.base.join(item)
    }

    pub fn results_file(&self, item: &str, data_type: DataType) -> PathBuf {
        self.item_dir(item).join(data_type.results_file_name())
    }

    pub fn screenshot_dir(&self, item: &str, bucket: &str) -> PathBuf {
        self.item_dir(item).join(bucket)
    }

    pub fn screenshot_file(&self, item: &str, bucket: &str, data_type: DataType) -> PathBuf {
        self.screenshot_dir(item, bucket)
            .join(format!("{}.png", data_type.region_tag()))
    }
}
