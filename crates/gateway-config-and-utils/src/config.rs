//! Configuration for the gateway.
//!
//! Everything the mediation layer needs to know about the process is read
//! exactly once, at startup, into an immutable [`Config`]. Nothing below this
//! point consults the environment again.

use crate::{CoreError, CoreResult};
use std::fmt;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default outbound call budget per rolling minute.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Default network timeout for a single remote call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_API_BASE_URL: &str = "API_BASE_URL";
const ENV_API_KEY: &str = "API_KEY";
const ENV_RATE_LIMIT: &str = "RATE_LIMIT_PER_MINUTE";
const ENV_DRY_RUN_DEFAULT: &str = "ENABLE_DRY_RUN_BY_DEFAULT";
const ENV_REQUIRE_CONFIRMATION: &str = "REQUIRE_CONFIRMATION_BULK";
const ENV_TEST_MODE: &str = "TEST_MODE";
const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT_SECS";

/// The process-wide safety flags, handed to the safety gate and the
/// confirmation guard at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetyPolicy {
    /// Force every operation into preview-only behavior.
    pub test_mode: bool,
    /// Preview when a call does not say otherwise.
    pub dry_run_by_default: bool,
    /// Require `confirmed=true` for operations touching more than one target.
    pub require_bulk_confirmation: bool,
}

/// Gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the remote fleet-management API.
    pub api_base_url: Url,
    /// Bearer token for the remote API.
    pub api_key: String,
    /// Maximum outbound calls per rolling 60 second window.
    pub rate_limit_per_minute: u32,
    /// Per-request network timeout.
    pub request_timeout_secs: u64,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Process-wide safety flags.
    pub safety: SafetyPolicy,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `API_BASE_URL` and `API_KEY` are required; everything else has a
    /// default.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).and_then(non_empty);

        let (base_url, api_key) = match (lookup(ENV_API_BASE_URL), lookup(ENV_API_KEY)) {
            (Some(url), Some(key)) => (url, key),
            (url, key) => {
                let missing: Vec<&str> = [(ENV_API_BASE_URL, url.is_none()), (ENV_API_KEY, key.is_none())]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                return Err(CoreError::Config(format!(
                    "missing required environment variables: {}",
                    missing.join(", ")
                )));
            }
        };

        let api_base_url = Url::parse(base_url.trim_end_matches('/'))?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(CoreError::Config(format!(
                "{} must be an http or https URL, got scheme '{}'",
                ENV_API_BASE_URL,
                api_base_url.scheme()
            )));
        }

        let rate_limit_per_minute = match lookup(ENV_RATE_LIMIT) {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                CoreError::Config(format!("{} must be a non-negative integer: {}", ENV_RATE_LIMIT, e))
            })?,
            None => DEFAULT_RATE_LIMIT_PER_MINUTE,
        };

        let request_timeout_secs = match lookup(ENV_REQUEST_TIMEOUT) {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                CoreError::Config(format!("{} must be a positive integer: {}", ENV_REQUEST_TIMEOUT, e))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if request_timeout_secs == 0 {
            return Err(CoreError::Config(format!("{} must be greater than zero", ENV_REQUEST_TIMEOUT)));
        }

        let flag = |key: &str| lookup(key).map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false);

        Ok(Self {
            api_base_url,
            api_key,
            rate_limit_per_minute,
            request_timeout_secs,
            log_level: lookup(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            safety: SafetyPolicy {
                test_mode: flag(ENV_TEST_MODE),
                dry_run_by_default: flag(ENV_DRY_RUN_DEFAULT),
                require_bulk_confirmation: flag(ENV_REQUIRE_CONFIRMATION),
            },
        })
    }

    /// The safety flags as a standalone value.
    pub fn safety_policy(&self) -> SafetyPolicy {
        self.safety
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .field("safety", &self.safety)
            .finish()
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("API_BASE_URL", "https://dash.example.com/wp-json/mainwp/v2"),
            ("API_KEY", "secret-token"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&required())).unwrap();
        assert_eq!(config.rate_limit_per_minute, DEFAULT_RATE_LIMIT_PER_MINUTE);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.safety, SafetyPolicy::default());
        assert_eq!(
            config.api_base_url.as_str(),
            "https://dash.example.com/wp-json/mainwp/v2"
        );
    }

    #[test]
    fn test_missing_required_names_both() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("API_BASE_URL"));
        assert!(message.contains("API_KEY"));
    }

    #[test]
    fn test_missing_key_only() {
        let err = Config::from_lookup(lookup_from(&[(
            "API_BASE_URL",
            "https://dash.example.com",
        )]))
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("API_KEY"));
        assert!(!message.contains("API_BASE_URL"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://dash.example.com"),
            ("API_KEY", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_invalid_url() {
        let err = Config::from_lookup(lookup_from(&[
            ("API_BASE_URL", "not a url"),
            ("API_KEY", "k"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidUrl(_)));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("API_BASE_URL", "ftp://dash.example.com"),
            ("API_KEY", "k"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://dash.example.com/api/"),
            ("API_KEY", "k"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://dash.example.com/api");
    }

    #[test]
    fn test_flags_only_literal_true() {
        let mut pairs = required();
        pairs.push(("TEST_MODE", "TRUE"));
        pairs.push(("ENABLE_DRY_RUN_BY_DEFAULT", "1"));
        pairs.push(("REQUIRE_CONFIRMATION_BULK", " true "));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(config.safety.test_mode);
        assert!(!config.safety.dry_run_by_default);
        assert!(config.safety.require_bulk_confirmation);
    }

    #[test]
    fn test_rate_limit_override_and_zero() {
        let mut pairs = required();
        pairs.push(("RATE_LIMIT_PER_MINUTE", "0"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.rate_limit_per_minute, 0);
    }

    #[test]
    fn test_rate_limit_garbage_is_error() {
        let mut pairs = required();
        pairs.push(("RATE_LIMIT_PER_MINUTE", "sixty"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_PER_MINUTE"));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let mut pairs = required();
        pairs.push(("REQUEST_TIMEOUT_SECS", "0"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::from_lookup(lookup_from(&required())).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_safety_policy_projection() {
        let mut pairs = required();
        pairs.push(("ENABLE_DRY_RUN_BY_DEFAULT", "true"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        let policy = config.safety_policy();
        assert!(policy.dry_run_by_default);
        assert!(!policy.test_mode);
    }
}
