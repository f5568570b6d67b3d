//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Route output to stdout or to `<path>/<save_name>.<file_ext>`
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Writes go through a non-blocking writer; the returned guard must be
//!   held until exit so buffered lines are flushed

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file in {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: InitError,
    },

    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Directives used when `RUST_LOG` is not set.
pub fn default_directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    format!("route_gateway={level},tower_http={level}")
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let writer: Box<dyn io::Write + Send> = match &config.path {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(&config.save_name)
                .filename_suffix(&config.file_ext)
                .build(dir)
                .map_err(|source| LoggingError::File {
                    path: dir.clone(),
                    source,
                })?;
            Box::new(appender)
        }
        None => Box::new(io::stdout()),
    };
    let (writer, guard) = tracing_appender::non_blocking(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(config.path.is_none()),
        )
        .try_init()?;

    Ok(guard)
}
