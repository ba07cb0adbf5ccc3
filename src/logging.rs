use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

const DEFAULT_LOG_FILE: &str = "tweet-sentiment.log";

/// Install the global subscriber described by `config`
///
/// `RUST_LOG` takes precedence over `config.level`. When `config.file_path` is
/// set, JSON lines also go to a daily-rotated file; the returned guard flushes
/// it on drop and must outlive the run.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("Failed to create log filter: {e}"))?;

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true);
    let stderr_layer = if config.format == "json" {
        stderr_layer.json().boxed()
    } else {
        stderr_layer.with_ansi(true).boxed()
    };

    let (file_layer, guard) = match config.file_path.as_deref().map(Path::new) {
        Some(log_path) => {
            let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = log_path
                .file_name()
                .map_or_else(|| DEFAULT_LOG_FILE.into(), |name| name.to_string_lossy().into_owned());
            let (writer, guard) = non_blocking(rolling::daily(directory, file_name));

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .json()
                .boxed();
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install subscriber: {e}"))?;

    info!(level = %config.level, format = %config.format, file = ?config.file_path, "Logging initialized");
    Ok(guard)
}

/// Times one pipeline stage
///
/// `finish` logs at info; a timer dropped without `finish` logs at debug.
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
    finished: bool,
}

impl OperationTimer {
    /// Start timing `operation`
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
            finished: false,
        }
    }

    /// Time since the timer started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer, log the duration and return it
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        let elapsed = self.elapsed();
        info!(operation = self.operation, duration_ms = elapsed.as_millis(), "Stage completed");
        elapsed
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            tracing::debug!(
                operation = self.operation,
                duration_ms = self.elapsed().as_millis(),
                "Stage abandoned"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_reports_elapsed() {
        let timer = OperationTimer::new("unit");
        std::thread::sleep(Duration::from_millis(2));
        assert!(timer.elapsed() >= Duration::from_millis(2));
        assert!(timer.finish() >= Duration::from_millis(2));
    }
}
