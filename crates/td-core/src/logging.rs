//! File logging for the monitor.
//!
//! The terminal belongs to the TUI, so logs go to `<base>/.todos/monitor.log`
//! through a non-blocking writer. The returned guard must be held for the
//! life of the process or buffered lines are lost.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::paths;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "TD_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Log setup options resolved by the CLI.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Explicit level or directive; wins over `TD_LOG`.
    pub level: Option<String>,
}

impl LogConfig {
    /// Picks the filter directive: explicit level, then `TD_LOG`, then `warn`.
    pub fn directive(&self) -> String {
        self.level
            .clone()
            .or_else(|| std::env::var(LOG_ENV).ok())
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
    }
}

/// Installs the global subscriber writing to the project's log file.
///
/// Returns `None` when a subscriber is already installed.
pub fn init(base_dir: &Path, config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let log_file = paths::log_path(base_dir);
    let dir = paths::todos_dir(base_dir);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let filter = EnvFilter::try_new(config.directive())
        .with_context(|| format!("Invalid log filter {:?}", config.directive()))?;

    let file_name = log_file
        .file_name()
        .map_or_else(|| "monitor.log".into(), |n| n.to_os_string());
    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => {
            tracing::info!(target: "logging", file = %log_file.display(), "logging_initialized");
            Ok(Some(guard))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_wins() {
        let config = LogConfig {
            level: Some("debug".to_string()),
        };
        assert_eq!(config.directive(), "debug");
    }

    #[test]
    fn test_blank_level_falls_back() {
        let config = LogConfig {
            level: Some("  ".to_string()),
        };
        assert!(!config.directive().trim().is_empty());
    }
}
