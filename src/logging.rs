use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter};

/// The dated, plain-text file layer handed back by [`file_layer`].
pub type FileLayer<S> = fmt::Layer<
    S,
    fmt::format::DefaultFields,
    fmt::format::Format<fmt::format::Full, ChronoLocal>,
    NonBlocking,
>;

/// Stdout logging always; file logging into `log_dir` (one file per day)
/// when a directory is given. Keep the returned guard alive until exit so
/// buffered lines reach the file.
pub fn init_logger(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    let (file_layer, guard) = match file_layer(log_dir) {
        Some((layer, guard)) => (Some(layer), Some(guard)),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(file_layer)
        .with(filter_layer)
        .init();

    if let Some(dir) = log_dir.filter(|_| guard.is_some()) {
        info!("Logging to {}", dir.display());
    }

    guard
}

/// File layer writing `HH:MM:SS`-stamped lines without colour codes to
/// `<log_dir>/YYYY-MM-DD.log`. `None` when logging is off or the directory
/// cannot be used.
pub fn file_layer<S>(log_dir: Option<&Path>) -> Option<(FileLayer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let appender = daily_appender(log_dir?)?;
    // the non-blocking worker is the only writer to the file
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_writer(non_blocking)
        .with_timer(ChronoLocal::new("%H:%M:%S".to_string()))
        .with_target(false)
        .with_ansi(false);
    Some((layer, guard))
}

fn daily_appender(dir: &Path) -> Option<RollingFileAppender> {
    if let Err(e) = fs::create_dir_all(dir) {
        eprintln!("Cannot create log directory {}: {}", dir.display(), e);
        return None;
    }
    match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_suffix("log")
        .build(dir)
    {
        Ok(appender) => Some(appender),
        Err(e) => {
            eprintln!("Cannot open log file in {}: {}", dir.display(), e);
            None
        }
    }
}

/// `log/` next to the first input path unless configured otherwise.
pub fn default_log_dir(first_path: &Path) -> PathBuf {
    let absolute = std::path::absolute(first_path).unwrap_or_else(|_| first_path.to_path_buf());
    absolute
        .parent()
        .unwrap_or(&absolute)
        .join("log")
}
