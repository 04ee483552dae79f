use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{DedupError, Result};

/// Daily-rolling log file under `config.dir`, creating the directory if needed.
pub fn file_appender(config: &LoggingConfig) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .build(&config.dir)
        .map_err(|e| {
            DedupError::Logging(format!(
                "cannot write logs to '{}': {}",
                config.dir.display(),
                e
            ))
        })
}

/// Initializes logging with a console layer on stderr and a daily-rolling JSON file.
///
/// Stdout is left to the report so `--json` output stays machine readable.
/// When the log directory cannot be created the file layer is skipped, a
/// warning goes to the console and `None` is returned. Otherwise the returned
/// guard flushes the file writer when dropped; hold it for the lifetime of the
/// process.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let (file_layer, guard, file_error) = match file_appender(config) {
        Ok(appender) => {
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(non_blocking_writer);
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // Respect RUST_LOG if set; otherwise info for our crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("store_dedup=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    if let Some(e) = file_error {
        warn!("File logging disabled: {}", e);
    }

    guard
}
