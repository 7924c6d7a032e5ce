//! Fixed-window request rate limiting keyed by client IP.
//!
//! Best-effort, single-process: counters live in memory and reset on
//! restart, and instances do not synchronize with each other. Entries are
//! never evicted; stale windows are overwritten on the next request from
//! the same key. That is an accepted bounded-growth tradeoff (the table
//! grows with the number of distinct client keys ever seen, not with
//! request volume).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::ClientKey;

/// Requests allowed per window.
pub const RATE_LIMIT: u32 = 100;

/// Window duration.
pub const RATE_WINDOW: Duration = Duration::from_millis(60_000);

struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Per-client fixed-window request counter.
///
/// `allow` is atomic per key: the mutex makes increment-and-compare a
/// single critical section, so concurrent requests from one client cannot
/// under-count the window.
pub struct RateLimiter {
    windows: Mutex<HashMap<ClientKey, WindowEntry>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(RATE_LIMIT, RATE_WINDOW)
    }

    /// Custom limits, used by tests.
    pub fn with_limits(limit: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            limit,
            window,
        }
    }

    /// Record a request for `key` and decide whether it is allowed.
    ///
    /// The request that brings the count to exactly the limit is still
    /// allowed; the one after it is rejected until the window resets.
    pub fn allow(&self, key: &ClientKey) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &ClientKey, now: Instant) -> bool {
        let mut windows = self.windows.lock().expect("rate limit lock poisoned");
        match windows.get_mut(key) {
            Some(entry) if now < entry.reset_at => {
                entry.count += 1;
                entry.count <= self.limit
            }
            _ => {
                windows.insert(
                    key.clone(),
                    WindowEntry {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                true
            }
        }
    }

    /// Seconds a rejected caller should wait before retrying.
    pub fn retry_after_seconds(&self) -> u64 {
        self.window.as_secs()
    }

    /// Number of distinct client keys seen so far.
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().expect("rate limit lock poisoned").len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
