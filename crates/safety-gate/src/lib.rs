//! Safety policy for fleet operations.
//!
//! Two independent checks run before anything mutating reaches the network:
//!
//! - [`SafetyGate`] resolves the [`OperatingMode`] of a call from the
//!   process-wide test-mode flag, the caller's explicit dry-run flag and the
//!   process-wide dry-run default, in that order of precedence.
//! - [`ConfirmationGuard`] refuses bulk work that was not explicitly
//!   confirmed when the bulk-confirmation policy is on.
//!
//! Both are built once from an immutable [`SafetyPolicy`] and never read
//! the environment.

mod confirmation;
mod mode;
mod preview;

pub use confirmation::{ConfirmationGuard, GuardError, GuardResult, FLEET_WIDE};
pub use gateway_config_and_utils::SafetyPolicy;
pub use mode::{OperatingMode, SafetyGate};
pub use preview::Preview;
