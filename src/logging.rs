use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{env_bool, env_string};

const LOG_FILE_PREFIX: &str = "daily-word.log";

/// Keeps the non-blocking file writer alive; drop it only at shutdown.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    env_bool("ENABLE_FILE_LOGS").unwrap_or(false)
}

fn log_dir() -> PathBuf {
    env_string("LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    if file_logging_enabled() {
        let dir = log_dir();
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let file_appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_PREFIX);
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_target(true);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(stdout_layer)
                    .with(file_layer)
                    .init();

                return Some(FileLogGuard { _guard: guard });
            }
            Err(err) => {
                eprintln!("failed to create log directory {}: {err}", dir.display());
            }
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();

    None
}
