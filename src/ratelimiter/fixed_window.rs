use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::clock::{Clock, SystemClock};
use super::RateLimiter;

/// Request count for one client inside its current window.
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    expires_at: Instant,
}

/// Fixed-window limiter: each client gets `limit` requests per `window`,
/// where the window opens on the client's first request and closes exactly
/// `window` later no matter how much traffic arrives in between.
///
/// Expiry is evaluated lazily on lookup, so no timer is spawned per client.
/// `purge_expired` reclaims entries of clients that never came back.
pub struct FixedWindowRateLimiter<C: Clock = SystemClock> {
    clients: Mutex<HashMap<String, Window>>,
    limit: u32,
    window: Duration,
    clock: C,
}

impl FixedWindowRateLimiter<SystemClock> {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_clock(limit, window, SystemClock)
    }
}

impl<C: Clock> FixedWindowRateLimiter<C> {
    pub fn with_clock(limit: u32, window: Duration, clock: C) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            limit,
            window,
            clock,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of clients currently holding a window, expired or not.
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    // A poisoned map only means another request panicked mid-update; the
    // counters themselves are still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<C: Clock> RateLimiter for FixedWindowRateLimiter<C> {
    fn allow(&self, client_id: &str) -> (bool, Duration) {
        let now = self.clock.now();
        let mut clients = self.lock();

        match clients.get_mut(client_id) {
            Some(window) if now < window.expires_at => {
                if window.count < self.limit {
                    window.count += 1;
                    (true, self.window)
                } else {
                    (false, self.window)
                }
            }
            // absent or expired: this request opens a fresh window
            _ => {
                if self.limit == 0 {
                    return (false, self.window);
                }
                clients.insert(
                    client_id.to_string(),
                    Window {
                        count: 1,
                        expires_at: now + self.window,
                    },
                );
                (true, self.window)
            }
        }
    }

    fn purge_expired(&self) {
        let now = self.clock.now();
        let mut clients = self.lock();
        let before = clients.len();
        clients.retain(|_, window| now < window.expires_at);
        let purged = before - clients.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = clients.len(), "purged expired rate limit windows");
        }
    }
}
