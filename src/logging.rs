//! File-based logging.
//!
//! The terminal belongs to the UI while the program runs, so log records go
//! to rotating files in a directory named on the command line.  Without one,
//! logging stays off.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use std::path::Path;
use thiserror::Error;

const LOG_FILE_BASENAME: &str = "weeksched";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";

/// Starts logging to `log_dir`.  The returned handle must be kept alive for
/// as long as records should be written.
pub(crate) fn init_logging(level: &str, log_dir: &Path) -> Result<LoggerHandle, LoggingError> {
    let level = normalize_level(level)?;
    std::fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.display().to_string(),
        source,
    })?;
    let handle = Logger::try_with_str(level)?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;
    log::info!(
        "event=app_start module=main status=ok version={} level={level} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        log_dir.display()
    );
    Ok(handle)
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        _ => Err(LoggingError::Level(level.to_owned())),
    }
}

#[derive(Debug, Error)]
pub(crate) enum LoggingError {
    #[error("unsupported log level {0:?}; expected trace|debug|info|warn|error|off")]
    Level(String),
    #[error("failed to create log directory {path}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to start logger")]
    Logger(#[from] flexi_logger::FlexiLoggerError),
}
