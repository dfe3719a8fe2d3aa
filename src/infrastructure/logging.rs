use std::{
    io::{self, IsTerminal},
    path::Path,
};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{
    config::{AppConfig, LoggingConfig},
    infrastructure::directories::ResolvedPaths,
};

const LOG_FILE_PREFIX: &str = "classifier";
const LOG_FILE_SUFFIX: &str = "log";

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Installs the global subscriber. Console output goes to stderr since
/// stdout carries the result lines; the daily file keeps
/// `retained_files` days of history.
pub fn init_tracing(config: &AppConfig, paths: &ResolvedPaths) -> Result<()> {
    if FILE_GUARD.get().is_some() {
        return Ok(());
    }

    let appender = daily_appender(&paths.logs_dir, &config.logging)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let console_layer = fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal());
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_thread_names(true)
        .with_ansi(false);

    let installed = tracing_subscriber::registry()
        .with(level_filter(&config.logging.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();
    if installed {
        let _ = FILE_GUARD.set(guard);
        tracing::info!(
            target: "logging",
            dir = %paths.logs_dir.display(),
            level = %config.logging.level,
            "tracing initialized"
        );
    }
    Ok(())
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn daily_appender(dir: &Path, logging: &LoggingConfig) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(logging.retained_files)
        .build(dir)
        .with_context(|| format!("failed to open log directory {}", dir.display()))
}
