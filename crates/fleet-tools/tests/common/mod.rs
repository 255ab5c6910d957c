#![allow(dead_code)]

use fleet_api_client::testing::{ManualClock, ScriptedTransport};
use fleet_api_client::{FleetApiClient, RateLimiter};
use fleet_tools::{FleetTools, ToolRegistry};
use gateway_config_and_utils::SafetyPolicy;
use std::sync::Arc;

pub struct Harness {
    pub registry: ToolRegistry,
    pub transport: Arc<ScriptedTransport>,
    pub clock: Arc<ManualClock>,
}

pub fn harness(policy: SafetyPolicy) -> Harness {
    harness_with_limit(policy, 1_000)
}

pub fn harness_with_limit(policy: SafetyPolicy, limit: u32) -> Harness {
    let transport = Arc::new(ScriptedTransport::new());
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let limiter = Arc::new(RateLimiter::with_clock(limit, clock.clone()));
    let client = FleetApiClient::new(transport.clone(), limiter);
    Harness {
        registry: ToolRegistry::new(FleetTools::new(client, policy)),
        transport,
        clock,
    }
}

pub fn live() -> SafetyPolicy {
    SafetyPolicy::default()
}

pub fn test_mode() -> SafetyPolicy {
    SafetyPolicy {
        test_mode: true,
        ..Default::default()
    }
}
