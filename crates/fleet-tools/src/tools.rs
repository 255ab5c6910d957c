//! The shared operation context.

use fleet_api_client::{ApiError, FleetApiClient, HttpTransport, RateLimiter, Transport};
use gateway_config_and_utils::{Config, SafetyPolicy};
use safety_gate::{ConfirmationGuard, SafetyGate};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// One client (one limiter, one transport) plus the safety policy, shared
/// by every concurrent call in the process.
#[derive(Clone)]
pub struct FleetTools {
    pub(crate) client: FleetApiClient,
    pub(crate) gate: SafetyGate,
    pub(crate) guard: ConfirmationGuard,
}

impl FleetTools {
    pub fn new(client: FleetApiClient, policy: SafetyPolicy) -> Self {
        Self {
            client,
            gate: SafetyGate::new(policy),
            guard: ConfirmationGuard::new(policy),
        }
    }

    /// Wire the reqwest transport and limiter from startup configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(
            &config.api_base_url,
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?);
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_per_minute));
        let policy = config.safety_policy();

        info!(
            base_url = %config.api_base_url,
            rate_limit = config.rate_limit_per_minute,
            test_mode = policy.test_mode,
            dry_run_by_default = policy.dry_run_by_default,
            require_bulk_confirmation = policy.require_bulk_confirmation,
            "Fleet tools initialized"
        );
        Ok(Self::new(FleetApiClient::new(transport, limiter), policy))
    }

    pub fn client(&self) -> &FleetApiClient {
        &self.client
    }

    pub fn gate(&self) -> &SafetyGate {
        &self.gate
    }
}

/// Split a comma-separated list, trimming and dropping empty entries.
pub(crate) fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
