use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Login attempts allowed per client within [`LOGIN_WINDOW`].
pub const LOGIN_MAX_ATTEMPTS: usize = 5;
pub const LOGIN_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Aged-out clients are pruned once every this many checks.
const CLEANUP_EVERY: u64 = 200;

/// In-memory sliding-window limiter keyed by client (hashed IP).
pub struct RateLimiter {
    max_attempts: usize,
    window: Duration,
    entries: Mutex<HashMap<String, Vec<Instant>>>,
    checks: AtomicU64,
}

impl Default for RateLimiter {
    fn default() -> Self {
        RateLimiter::new(LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        RateLimiter {
            max_attempts,
            window,
            entries: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an attempt and return true if it is still under the limit.
    pub fn check_and_record(&self, key: &str) -> bool {
        self.check_and_record_at(key, Instant::now())
    }

    fn check_and_record_at(&self, key: &str, now: Instant) -> bool {
        let mut map = self.entries();
        if self.checks.fetch_add(1, Ordering::Relaxed).is_multiple_of(CLEANUP_EVERY) {
            prune(&mut map, now, self.window);
        }
        let attempts = map.entry(key.to_string()).or_default();
        attempts.retain(|t| now.saturating_duration_since(*t) < self.window);

        if attempts.len() < self.max_attempts {
            attempts.push(now);
            true
        } else {
            false
        }
    }

    /// Forget a client after a successful sign-in.
    pub fn reset(&self, key: &str) {
        self.entries().remove(key);
    }
}

/// Drop clients whose attempts have all aged out.
fn prune(map: &mut HashMap<String, Vec<Instant>>, now: Instant, window: Duration) {
    map.retain(|_, attempts| {
        attempts.retain(|t| now.saturating_duration_since(*t) < window);
        !attempts.is_empty()
    });
}
