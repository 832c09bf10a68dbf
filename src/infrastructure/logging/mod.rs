// Logging module - Logging infrastructure
use crate::domain::{config::LoggingConfig, error::{GrabError, GrabResult}};
use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the event filter: `RUST_LOG` wins, then `--verbose`, then the
/// configured level.
pub fn build_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = if verbose { "debug" } else { config.log_level.as_str() };
    EnvFilter::try_new(format!("serialgrab={}", level))
        .unwrap_or_else(|_| EnvFilter::new("serialgrab=info"))
}

/// Open the log file for appending, creating its directory if needed.
pub fn open_log_file(config: &LoggingConfig) -> GrabResult<File> {
    if let Some(parent) = config.log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| GrabError::Config {
            message: format!("Failed to create log directory {}: {}", parent.display(), e),
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| GrabError::Config {
            message: format!("Failed to open log file {}: {}", config.log_file.display(), e),
        })
}

/// Initialize logging system: events go to the log file, and also to
/// stderr when `verbose` is set.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> GrabResult<()> {
    let file = open_log_file(config)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_level(true);

    let stderr_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_level(true)
    });

    tracing_subscriber::registry()
        .with(build_filter(config, verbose))
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| GrabError::Config {
            message: format!("Failed to initialize logging: {}", e),
        })?;

    tracing::info!("SerialGrab logging initialized, writing to {}", config.log_file.display());
    Ok(())
}
