//! Daily log file under the engine's log directory.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::models::error::CaptureError;

/// `CaptureEngine-YYYY-MM-DD.log`
pub fn log_file_name(date: NaiveDate) -> String {
    format!("CaptureEngine-{}.log", date.format("%Y-%m-%d"))
}

/// Install a logger that appends `[timestamp] [LEVEL] message` lines to
/// today's log file in `log_dir`.
///
/// The level defaults to `info` and can be overridden through `RUST_LOG`.
/// Returns the log file path. If a global logger is already installed it
/// is left in place.
pub fn init_file_logger(log_dir: &Path) -> Result<PathBuf, CaptureError> {
    fs::create_dir_all(log_dir)
        .map_err(|e| CaptureError::StorageError(format!("failed to create log directory: {}", e)))?;

    let path = log_dir.join(log_file_name(Local::now().date_naive()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| CaptureError::StorageError(format!("failed to open log file: {}", e)))?;

    let installed = Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .try_init();

    if installed.is_err() {
        log::debug!("Logger already installed, keeping it");
    }
    Ok(path)
}
