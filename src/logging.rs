//! Log output for the relay.
//!
//! `run` writes JSON records to a daily-rotated file under the configured log
//! directory and a readable copy to stderr ([`init_production`]). `parse` and
//! `check` only talk to stderr ([`init_cli`]). `RUST_LOG` overrides the
//! configured level in both modes.

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Where and how much the relay logs, taken from `[runtime]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Directory for rotated files.
    pub dir: PathBuf,
    /// File name before the date suffix (`signwatch.log` gives
    /// `signwatch.log.2024-05-01`).
    pub file_prefix: String,
    /// Filter directive used when `RUST_LOG` is unset or invalid.
    pub level: String,
}

/// Keeps the background file writer alive. Dropping it flushes what is
/// buffered, so hold it until the relay has drained.
pub struct LoggingGuard {
    _writer: WorkerGuard,
}

/// Install the file and stderr layers for a relay run.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created.
pub fn init_production(settings: &LogSettings) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(&settings.dir)
        .with_context(|| format!("failed to create log directory {}", settings.dir.display()))?;

    let rotation = tracing_appender::rolling::daily(&settings.dir, &settings.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(rotation);

    tracing_subscriber::registry()
        .with(level_filter(&settings.level))
        .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(LoggingGuard { _writer: guard })
}

/// Install a stderr-only subscriber for the one-shot subcommands.
pub fn init_cli(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(level_filter(level))
        .with_writer(std::io::stderr)
        .init();
}

fn level_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}
