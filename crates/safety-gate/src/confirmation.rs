//! Bulk and destructive operation confirmation.

use gateway_config_and_utils::SafetyPolicy;
use thiserror::Error;
use tracing::debug;

/// Target count used when an operation addresses the whole fleet and the
/// exact number of sites is not known up front.
pub const FLEET_WIDE: usize = usize::MAX;

/// Refusals from the confirmation guard.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardError {
    /// A bulk operation needs `confirmed=true`.
    #[error("{}", bulk_message(*.target_count))]
    ConfirmationRequired {
        /// Number of targets, or [`FLEET_WIDE`].
        target_count: usize,
    },

    /// An irreversible single-target operation needs `confirmed=true`.
    #[error("{action} requires confirmation. Set confirmed=true to proceed. {consequence}")]
    DestructiveUnconfirmed {
        action: String,
        consequence: String,
    },
}

fn bulk_message(target_count: usize) -> String {
    let scope = if target_count == FLEET_WIDE {
        "all sites".to_string()
    } else {
        format!("{} targets", target_count)
    };
    format!(
        "This operation affects {}. Set confirmed=true to proceed with bulk operation.",
        scope
    )
}

/// Result type alias using GuardError.
pub type GuardResult<T> = Result<T, GuardError>;

/// Decides whether an operation may proceed given its target count.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationGuard {
    require_bulk_confirmation: bool,
}

impl ConfirmationGuard {
    pub fn new(policy: SafetyPolicy) -> Self {
        Self {
            require_bulk_confirmation: policy.require_bulk_confirmation,
        }
    }

    /// Single-target work is always allowed; bulk work needs `confirmed`
    /// only while the policy is on.
    pub fn check(&self, target_count: usize, confirmed: bool) -> GuardResult<()> {
        if target_count <= 1 || !self.require_bulk_confirmation || confirmed {
            return Ok(());
        }
        debug!(target_count, "Bulk operation refused without confirmation");
        Err(GuardError::ConfirmationRequired { target_count })
    }

    /// Irreversible operations need `confirmed` regardless of policy.
    pub fn check_destructive(
        &self,
        action: &str,
        consequence: &str,
        confirmed: bool,
    ) -> GuardResult<()> {
        if confirmed {
            return Ok(());
        }
        Err(GuardError::DestructiveUnconfirmed {
            action: action.to_string(),
            consequence: consequence.to_string(),
        })
    }
}
