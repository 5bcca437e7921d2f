//! Tracing setup for the terminal front end.
//!
//! Stdout belongs to the conversation, so log records go to a daily rolling
//! file (`neurobot.log.YYYY-MM-DD`) and only fall back to stderr when no log
//! directory is usable.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "NEUROBOT_LOG";

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the whole process.
pub fn init(logs_dir: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = logs_dir.and_then(|dir| {
        std::fs::create_dir_all(dir).ok()?;
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("neurobot.log")
            .build(dir)
            .ok()
    });

    match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_writer(writer).with_ansi(false);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .try_init();
            tracing::debug!("[Logging] Writing logs to {:?}", logs_dir);
            Some(guard)
        }
        None => {
            let stderr_layer = fmt::layer().with_writer(std::io::stderr).compact();
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .try_init();
            tracing::warn!("[Logging] No usable log directory, logging to stderr");
            None
        }
    }
}
