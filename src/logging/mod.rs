//! Structured logging for the tamper detector
//!
//! Console and daily-rolling JSON file output built on `tracing`, with
//! request-scoped spans carrying a per-upload request id.

pub mod config;
pub mod spans;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use config::LoggingConfig;
pub use spans::{ComparisonSpan, RequestSpan};

/// Initialize the logging system with the provided configuration.
///
/// The returned guard flushes the file writer when dropped, so the caller
/// must hold it for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let crate_name = env!("CARGO_PKG_NAME").replace('-', "_");
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives(&crate_name)));

    let mut layers = Vec::new();
    let mut guard = None;

    if config.console_output {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(config.include_file_location)
            .with_file(config.include_file_location)
            .with_timer(fmt::time::ChronoUtc::rfc_3339());
        layers.push(console_layer.boxed());
    }

    if let Some(ref log_dir) = config.log_directory {
        let file_appender = tracing_appender::rolling::daily(log_dir, "pan-detector.log");
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .json();
        layers.push(file_layer.boxed());
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()?;

    tracing::info!("Logging system initialized with config: {:?}", config);
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_logging_init_with_file_output() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggingConfig {
            log_directory: Some(temp_dir.path().to_path_buf()),
            ..LoggingConfig::default()
        };

        // A second global subscriber in the same test binary is refused
        // rather than panicking.
        let first = init_logging(&config);
        let second = init_logging(&config);
        assert!(first.is_ok());
        assert!(second.is_err());
    }
}
