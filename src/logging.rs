//! Console + file logging behind the `log` facade.
//!
//! Every record is printed to stdout and appended to
//! `<exe_dir>/logs/price_sampler.log` with a timestamp. Panics are written to
//! the same file.

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::paths;

const LOG_FILE_NAME: &str = "price_sampler.log";

struct DualLogger {
    level: LevelFilter,
    file: Option<PathBuf>,
}

fn format_line(level: Level, target: &str, msg: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    if level <= Level::Warn || target.is_empty() {
        format!("[{}] {:<5} {}\n", timestamp, level, msg)
    } else {
        format!("[{}] {:<5} {}: {}\n", timestamp, level, target, msg)
    }
}

fn append_to(path: &PathBuf, line: &str) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = file.write_all(line.as_bytes());
    }
}

impl Log for DualLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            record.level(),
            record.target(),
            &record.args().to_string(),
        );
        print!("{}", line);
        if let Some(path) = &self.file {
            append_to(path, &line);
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

/// Installs the logger and the panic hook. Later calls are ignored.
pub fn init(level: LevelFilter) {
    let logs_dir = paths::get_logs_dir();
    let file = match fs::create_dir_all(&logs_dir) {
        Ok(()) => Some(logs_dir.join(LOG_FILE_NAME)),
        Err(e) => {
            eprintln!("Cannot create {}: {}. Logging to console only.", logs_dir.display(), e);
            None
        }
    };

    let panic_file = file.clone();
    std::panic::set_hook(Box::new(move |panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        let line = format!("[PANIC]{} {}\n", location, msg);
        eprint!("{}", line);
        if let Some(path) = &panic_file {
            append_to(path, &line);
        }
    }));

    let logger = DualLogger { level, file };
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(level);
    }
}
