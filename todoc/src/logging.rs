use anyhow::Result;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `<config dir>/todoc/logs`
pub fn logs_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(anyhow::anyhow!("Could not find config directory"))?
        .join("todoc");

    Ok(config_dir.join("logs"))
}

/// Initialize tracing with file-based logging
/// Logs are written to ~/.config/todoc/logs/todoc-YYYY-MM-DD-HH-MM-SS.log
///
/// The returned guard flushes pending lines when dropped; hold it for the
/// lifetime of the program.
pub fn init_logging() -> Result<(PathBuf, WorkerGuard)> {
    init_logging_in(&logs_dir()?)
}

pub fn init_logging_in(logs_dir: &Path) -> Result<(PathBuf, WorkerGuard)> {
    std::fs::create_dir_all(logs_dir)?;

    let log_filename = log_file_name(Local::now());
    let log_path = logs_dir.join(&log_filename);

    let file_appender = tracing_appender::rolling::never(logs_dir, &log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    // Default to INFO, RUST_LOG overrides
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()?;

    Ok((log_path, guard))
}

fn log_file_name(now: chrono::DateTime<Local>) -> String {
    format!("todoc-{}.log", now.format("%Y-%m-%d-%H-%M-%S"))
}
