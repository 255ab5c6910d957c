//! Logging initialization for the gateway.
//!
//! Thin wrapper over the observability package so the binary has a single
//! call to make at startup.

use std::path::PathBuf;

pub use observability::LogConfig;

/// Initialize the logging system for the gateway.
///
/// This sets up tracing with:
/// - Compact lines on stderr (stdout belongs to the tool protocol)
/// - An optional JSON-lines file when `log_path` is given
/// - Log level from RUST_LOG env var or the provided default
pub fn init_logging(level: &str, log_path: Option<PathBuf>) {
    observability::init_with_config(LogConfig {
        service_name: "fleet-gateway".into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path,
        also_stderr: true,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
