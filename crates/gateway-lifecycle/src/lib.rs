//! Lifecycle management for the fleet gateway.
//!
//! Tracks in-flight calls so shutdown can stop admitting new work and then
//! wait for what is already running to finish.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, info};

/// Errors from lifecycle management.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Gateway is shutting down; no new calls are accepted")]
    ShuttingDown,
}

#[derive(Debug)]
struct Inner {
    shutting_down: AtomicBool,
    in_flight: AtomicUsize,
    idle: Notify,
    shutdown_tx: broadcast::Sender<()>,
}

/// Admission gate shared by every call handler.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Debug, Clone)]
pub struct ShutdownGate {
    inner: Arc<Inner>,
}

impl Default for ShutdownGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownGate {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                shutting_down: AtomicBool::new(false),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
                shutdown_tx,
            }),
        }
    }

    /// Admit one call, or `None` once shutdown has begun.
    pub fn try_enter(&self) -> Option<CallPermit> {
        // Count first so a concurrent wait_idle cannot miss this call.
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.inner.shutting_down.load(Ordering::SeqCst) {
            release(&self.inner);
            return None;
        }
        Some(CallPermit {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Like [`try_enter`](Self::try_enter) but with a typed refusal.
    pub fn enter(&self) -> Result<CallPermit, LifecycleError> {
        self.try_enter().ok_or(LifecycleError::ShuttingDown)
    }

    /// Stop admitting calls. Idempotent.
    pub fn begin_shutdown(&self) {
        if self.inner.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            in_flight = self.in_flight(),
            "Shutdown requested, draining in-flight calls"
        );
        let _ = self.inner.shutdown_tx.send(());
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Receiver that fires once when shutdown begins.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.inner.shutdown_tx.subscribe()
    }

    /// Resolve once no permits are outstanding.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight() == 0 {
                debug!("All in-flight calls finished");
                return;
            }
            notified.await;
        }
    }
}

fn release(inner: &Inner) {
    if inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
        inner.idle.notify_waiters();
    }
}

/// Held for the duration of one admitted call.
#[derive(Debug)]
pub struct CallPermit {
    inner: Arc<Inner>,
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        release(&self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn admits_until_shutdown() {
        let gate = ShutdownGate::new();
        let permit = gate.try_enter();
        assert!(permit.is_some());
        assert_eq!(gate.in_flight(), 1);

        gate.begin_shutdown();
        assert!(gate.is_shutting_down());
        assert!(gate.try_enter().is_none());
        assert_eq!(gate.enter().unwrap_err(), LifecycleError::ShuttingDown);
        assert_eq!(gate.in_flight(), 1);

        drop(permit);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn begin_shutdown_is_idempotent() {
        let gate = ShutdownGate::new();
        let mut rx = gate.subscribe();
        gate.begin_shutdown();
        gate.begin_shutdown();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn wait_idle_returns_immediately_when_idle() {
        let gate = ShutdownGate::new();
        gate.begin_shutdown();
        tokio::time::timeout(Duration::from_millis(100), gate.wait_idle())
            .await
            .expect("idle gate should not block");
    }

    #[tokio::test]
    async fn wait_idle_waits_for_outstanding_permits() {
        let gate = ShutdownGate::new();
        let first = gate.try_enter().unwrap();
        let second = gate.try_enter().unwrap();
        gate.begin_shutdown();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_idle().await })
        };

        drop(first);
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(second);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_idle should resolve after the last permit drops")
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn permits_dropped_on_other_tasks_release_the_waiter() {
        let gate = ShutdownGate::new();
        let mut handles = Vec::new();
        for i in 0..16u64 {
            let permit = gate.try_enter().unwrap();
            handles.push(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(i)).await;
                drop(permit);
            }));
        }
        gate.begin_shutdown();

        tokio::time::timeout(Duration::from_secs(2), gate.wait_idle())
            .await
            .expect("drain should complete");
        assert_eq!(gate.in_flight(), 0);
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
