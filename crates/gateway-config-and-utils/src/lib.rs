//! Core configuration, errors, and logging setup for the fleet gateway.

mod config;
mod error;
mod logging;

pub use config::{
    Config, SafetyPolicy, DEFAULT_LOG_LEVEL, DEFAULT_RATE_LIMIT_PER_MINUTE,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
