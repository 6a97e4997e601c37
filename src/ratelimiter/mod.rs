//! Per-client admission control.
//!
//! The limiter is consulted once per inbound request, keyed by the client
//! address, before any routing or authentication happens.

pub mod clock;
pub mod fixed_window;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub use clock::{Clock, SystemClock};
pub use fixed_window::FixedWindowRateLimiter;

/// Admission decision for a single client.
///
/// Implementations never fail: every string is a valid key. The returned
/// duration is advisory and may be surfaced to the client as `Retry-After`.
pub trait RateLimiter: Send + Sync {
    fn allow(&self, client_id: &str) -> (bool, Duration);

    /// Drops state that can no longer influence a decision.
    fn purge_expired(&self) {}
}

/// Periodically calls [`RateLimiter::purge_expired`] until the handle is
/// aborted.
pub fn spawn_purge_task(limiter: Arc<dyn RateLimiter>, every: Duration) -> JoinHandle<()> {
    let every = every.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            limiter.purge_expired();
        }
    })
}
