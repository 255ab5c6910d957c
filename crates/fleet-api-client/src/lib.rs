//! Rate-limited client for the remote fleet-management API.
//!
//! Every outbound call takes the same path:
//!
//! ```text
//! FleetApiClient::request → RateLimiter::reserve → Transport::send → ApiError normalization
//! ```
//!
//! - **Strict limiter**: a full window rejects immediately with a retry hint,
//!   it never queues or sleeps.
//! - **One failure kind**: HTTP status failures, missing responses and
//!   unbuildable requests all become [`ApiError`].
//! - **Injectable seams**: [`Transport`] and [`Clock`] are traits so the
//!   layers above can be exercised without a network or a real clock.

mod client;
mod clock;
mod error;
mod rate_limiter;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use client::{FleetApiClient, IgnoreKind};
pub use clock::{Clock, SystemClock};
pub use error::{ApiError, ClientError, ClientResult};
pub use rate_limiter::{CallWindow, RateLimitExceeded, RateLimiter, WINDOW_MILLIS};
pub use transport::{
    normalize_status_failure, parse_success_body, ApiRequest, HttpTransport, Method, Transport,
};
