//! File logging. The terminal is owned by the UI, so nothing is written to
//! stdout or stderr while the sequence runs.

use std::path::Path;

use lostpage_engine::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE: &str = "lostpage.log";

/// Install the global subscriber. The returned guard flushes the writer on
/// drop and must be held for the life of the program. Returns `None` when
/// no log directory could be determined.
pub fn init(config: &AppConfig) -> color_eyre::Result<Option<WorkerGuard>> {
    let Some(directory) = config.log_directory() else {
        return Ok(None);
    };
    init_in(&directory, &config.logging.filter).map(Some)
}

fn init_in(directory: &Path, default_filter: &str) -> color_eyre::Result<WorkerGuard> {
    std::fs::create_dir_all(directory)?;
    let appender = tracing_appender::rolling::never(directory, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // RUST_LOG wins over the configured filter.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;

    tracing::info!(directory = %directory.display(), "logging initialised");
    Ok(guard)
}
