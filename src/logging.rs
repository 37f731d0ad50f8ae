//! Tracing setup for the `docsift` binary.
//!
//! Events go to stderr through a compact formatter, leaving stdout for the result path.
//! Setting `DOCSIFT_LOG_FILE` adds a second, ANSI-free layer appended to that file through a
//! non-blocking writer.
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable naming the optional log file.
pub const LOG_FILE_VAR: &str = "DOCSIFT_LOG_FILE";

/// Flushes buffered file output when dropped.
///
/// Hold it until the process is about to exit; events still queued when the guard is
/// dropped are written out first.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Both variables are read when this
/// runs, so a `.env` file must already be merged into the environment.
pub fn init_tracing() -> LoggingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let (writer, guard) = log_file_path().and_then(open_log_file).unzip();
    let file_layer = writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    LoggingGuard { _file: guard }
}

fn log_file_path() -> Option<PathBuf> {
    std::env::var_os(LOG_FILE_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn open_log_file(path: PathBuf) -> Option<(NonBlocking, WorkerGuard)> {
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}
