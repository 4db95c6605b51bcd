//! Logging and tracing configuration
//!
//! Logs go to stderr so the CLI report on stdout stays readable. The log
//! file, when enabled, lives in the data directory.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use super::config::LoggingConfig;
use super::paths;

/// Name of the log file inside the log directory
const LOG_FILE: &str = "actionflow.log";

/// Initialize tracing
///
/// `RUST_LOG` takes precedence over the configured filter. Returns a guard
/// that must be kept alive for the file writer to flush, plus the log file
/// path when file logging is active.
pub fn init(config: &LoggingConfig) -> (Option<WorkerGuard>, Option<PathBuf>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("actionflow=info,warn"));

    if config.file {
        if let Some(log_dir) = paths::log_dir() {
            if std::fs::create_dir_all(&log_dir).is_ok() {
                let appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let file_layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true);

                tracing_subscriber::registry()
                    .with(filter)
                    .with(file_layer)
                    .with(stderr_layer())
                    .init();

                return (Some(guard), Some(log_dir.join(LOG_FILE)));
            }
            eprintln!("Warning: Could not create log directory {}", log_dir.display());
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer())
        .init();

    (None, None)
}

/// Compact stderr output, built per subscriber stack
fn stderr_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
}
