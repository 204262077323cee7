//! Tracing subscriber setup.
//!
//! Noisy HTTP modules are held at `warn` unless `RUST_LOG` says otherwise.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::LogConfig;

pub const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "native_tls"];

const LOG_FILE_PREFIX: &str = "confab.log";

/// Builds the filter: `RUST_LOG` if set, else `level` with noisy modules at warn.
pub fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = level.to_string();
    for module in NOISY_MODULES {
        directives.push(',');
        directives.push_str(module);
        directives.push_str("=warn");
    }
    EnvFilter::new(directives)
}

/// Installs the global subscriber.
///
/// `default_level` applies when the config sets no level. Logs go to stderr, or to daily files under `<home>/logs` when
/// `config.file` is set. Keep the returned guard alive until exit so
/// buffered file output is flushed.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(
    config: &LogConfig,
    default_level: &str,
    home: &Path,
) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config.level_or(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.file {
        let dir = home.join("logs");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true),
            )
            .try_init()
            .context("Failed to install tracing subscriber")?;
        Ok(Some(guard))
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()
            .context("Failed to install tracing subscriber")?;
        Ok(None)
    }
}
