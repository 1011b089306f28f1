//! The inactivity-timer collaborator contract, per `spec.md` §4.7.
//!
//! The original's `schedule(delay, callback) -> handle` with
//! `handle.cancel()/.reset()/.delay(dt)` is a callback-style API suited to
//! the source's reactor (`asynclib.py::call_later`). In async Rust the
//! idiomatic equivalent is an awaitable: the engine races `scheduler.sleep
//! (timeout)` against the next transport read inside `tokio::select!` on
//! every loop turn. "Arming on every send, resetting on every receive"
//! (spec.md §4.2) falls out naturally: each loop iteration starts a fresh
//! sleep, so a receive that loops back around discards the old one and a
//! send that doesn't loop has none pending until the next read is awaited.
//! "Cancel" is simply not selecting on it; "delay(dt)" is passing a
//! different duration on the next call.

use std::time::Duration;

use async_trait::async_trait;

/// A pluggable source of inactivity-timeout futures. Production code uses
/// [`TokioScheduler`]; tests that want a deterministic or instantly-firing
/// timer can substitute their own.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Resolves after `duration` has elapsed since this call.
    async fn sleep(&self, duration: Duration);
}

/// The default scheduler, backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A scheduler whose timer never fires — used when `timeout` is `None`
/// (inactivity timer disabled), matching `timeout=None` in the original.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScheduler;

#[async_trait]
impl Scheduler for NullScheduler {
    async fn sleep(&self, _duration: Duration) {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_fires_after_duration() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = fired.clone();
        let scheduler = TokioScheduler;
        let handle = tokio::spawn(async move {
            scheduler.sleep(Duration::from_secs(5)).await;
            fired2.store(true, Ordering::SeqCst);
        });
        tokio::time::advance(Duration::from_secs(6)).await;
        handle.await.unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn null_scheduler_never_fires() {
        let scheduler = NullScheduler;
        tokio::select! {
            _ = scheduler.sleep(Duration::from_millis(1)) => panic!("should never fire"),
            _ = tokio::time::sleep(Duration::from_millis(20)) => {}
        }
    }
}
