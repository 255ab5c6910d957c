//! Test doubles for the client seams.
//!
//! Enabled for this crate's own tests and, through the `test-support`
//! feature, for downstream crates' tests.

use crate::clock::Clock;
use crate::error::ApiError;
use crate::transport::{ApiRequest, Method, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

type Reply = Result<Value, ApiError>;

/// A transport that records every request and answers from a script.
///
/// Replies are keyed by `(method, path)`. One-shot replies queued with
/// [`respond_once`](Self::respond_once) are consumed first; otherwise the
/// sticky reply set with [`respond`](Self::respond) is returned every time.
/// Unscripted calls fail with a 404 naming the route.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    once: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    sticky: Mutex<HashMap<(Method, String), Reply>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `(method, path)` call with `reply`.
    pub fn respond(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.sticky.lock().insert((method, path.to_string()), reply);
        self
    }

    /// Answer the next `(method, path)` call with `reply`.
    pub fn respond_once(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.once
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Requests that would have changed remote state.
    pub fn mutating_requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method.is_mutating())
            .cloned()
            .collect()
    }

    /// `METHOD /path` lines, handy for ordering assertions.
    pub fn routes(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let key = (request.method, request.path.clone());
        self.requests.lock().push(request);

        if let Some(reply) = self.once.lock().get_mut(&key).and_then(VecDeque::pop_front) {
            return reply;
        }
        if let Some(reply) = self.sticky.lock().get(&key) {
            return reply.clone();
        }
        Err(ApiError::with_status(
            404,
            format!("no scripted response for {} {}", key.0, key.1),
        ))
    }
}
