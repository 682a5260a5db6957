// Logging setup - daily rolling file in the log dir, never the terminal
// (the TUI owns the screen)

use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "gridtunes.log";

pub fn default_filter(dev: bool) -> &'static str {
    if dev {
        "debug"
    } else {
        "info,gridtunes=debug"
    }
}

/// Installs the global subscriber. Keep the guard alive until exit or the
/// tail of the log is lost.
pub fn init(log_dir: &Path, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG wins over the built-in default
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(dev)));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_widens_filter() {
        assert_eq!(default_filter(true), "debug");
        assert!(default_filter(false).contains("gridtunes=debug"));
    }
}
