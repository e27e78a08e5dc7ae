//! Tracing subscriber setup.
//!
//! Chat mode owns the terminal, so its logs go to a file under
//! `<PARLEY_HOME>/logs`. Exec mode logs to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Env var holding a filter directive (overrides `[log] level`).
pub const LOG_ENV: &str = "PARLEY_LOG";

const LOG_FILE: &str = "parley.log";
const FALLBACK_LEVEL: &str = "warn";

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to `parley.log` inside the directory.
    File(PathBuf),
    Stderr,
}

/// Keeps the background log writer alive; drop it on exit to flush.
#[must_use]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Installs the global subscriber.
///
/// `default_level` is used when PARLEY_LOG is unset or invalid.
pub fn init(target: &LogTarget, default_level: &str) -> Result<LogGuard> {
    let filter = build_filter(std::env::var(LOG_ENV).ok().as_deref(), default_level);

    match target {
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, worker) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|err| anyhow!("Failed to install log subscriber: {err}"))?;
            Ok(LogGuard {
                _worker: Some(worker),
            })
        }
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|err| anyhow!("Failed to install log subscriber: {err}"))?;
            Ok(LogGuard { _worker: None })
        }
    }
}

fn build_filter(from_env: Option<&str>, default_level: &str) -> EnvFilter {
    from_env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(default_level).ok())
        .unwrap_or_else(|| EnvFilter::new(FALLBACK_LEVEL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_directive_wins() {
        assert_eq!(build_filter(Some("debug"), "info").to_string(), "debug");
    }

    #[test]
    fn test_config_level_used_without_env() {
        assert_eq!(build_filter(None, "info").to_string(), "info");
    }

    #[test]
    fn test_invalid_directives_fall_back() {
        assert_eq!(build_filter(Some("parley=loud"), "info").to_string(), "info");
        assert_eq!(build_filter(None, "parley=loud").to_string(), "warn");
    }
}
