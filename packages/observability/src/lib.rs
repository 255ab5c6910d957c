//! # Observability
//!
//! Tracing setup for the fleet gateway.
//!
//! Crates are log producers only. They use the standard `tracing` macros and
//! know nothing about where the events end up. The binary calls
//! [`init_with_config`] once at startup.
//!
//! Two sinks are supported:
//!
//! - stderr, compact human-readable lines (stdout carries the tool protocol
//!   and is never written to)
//! - an optional JSON-lines file, appended to with a flush per line so it can
//!   be followed with `tail -f gateway.jsonl | jq`
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "fleet-gateway".into(),
//!     default_level: "debug".into(),
//!     ..Default::default()
//! });
//! ```

mod writer;

use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use writer::{AppendLogWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, recorded once at startup.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional JSON-lines log file.
    pub log_path: Option<PathBuf>,

    /// Emit compact lines on stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Initialize the global subscriber.
///
/// A log file that cannot be opened is reported on stderr and skipped;
/// logging must never stop the gateway from starting. Calling this twice is
/// a no-op for the second call.
pub fn init_with_config(config: LogConfig) {
    let file_layer = match config.log_path.as_ref() {
        Some(path) => match AppendLogWriter::new(path) {
            Ok(writer) => Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(WriterFactory::new(writer))
                    .with_filter(env_filter(&config.default_level)),
            ),
            Err(e) => {
                eprintln!("failed to open log file {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };

    let stderr_layer = if config.also_stderr {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .compact()
                .with_writer(io::stderr)
                .with_ansi(false)
                .with_filter(env_filter(&config.default_level)),
        )
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service = %config.service_name,
            log_path = ?config.log_path,
            "observability initialized"
        );
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(config.also_stderr);
    }

    #[test]
    fn test_env_filter_accepts_level_directive() {
        // Only checks that construction does not panic for plain levels.
        let _ = env_filter("debug");
        let _ = env_filter("fleet_tools=trace,info");
    }
}
