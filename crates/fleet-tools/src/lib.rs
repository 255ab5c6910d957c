//! Fleet Tools: safety-gated orchestration of fleet-management operations.
//!
//! Every operation follows the same path:
//!
//! ```text
//! params → ConfirmationGuard → SafetyGate
//!            ├─ DryRun / TestMode → (optional read) → Simulated
//!            └─ Live → FleetApiClient (RateLimiter → Transport)
//!                        ├─ ok → Success
//!                        └─ err → FallbackResolver (tags only) → Success(degraded) | Failure
//! ```
//!
//! # Design Principles
//!
//! - **One outcome per call**: orchestrators never return `Result`; every
//!   failure folds into [`Outcome::Failure`] with a classified cause.
//! - **Previews never mutate**: in dry-run and test mode no mutating request
//!   reaches the transport. Previews may still read.
//! - **Shared throughput budget**: all concurrent calls use one client, so
//!   one rate limiter governs the whole process.

mod fallback;
pub mod ops;
mod outcome;
mod registry;
mod tools;

pub use fallback::{records, DerivedIndex, DerivedTag, FallbackResolver, SITES_LIST_SOURCE};
pub use outcome::{FailureCause, Outcome, ToolResult};
pub use registry::{ToolRegistry, ToolSpec, TOOLS};
pub use tools::FleetTools;
