//! Per-provider pacing between consecutive upstream calls.
//!
//! Enforces a minimum wall-clock interval between calls that share a
//! provider identity, so informal per-provider rate contracts are respected
//! even before any breaker has tripped.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::provider::ProviderId;

/// Default minimum interval between calls to one provider.
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(200);

/// Per-provider minimum-interval limiter.
///
/// Callers racing on the same identity are granted strictly spaced slots;
/// distinct identities never wait on each other. Slot bookkeeping happens
/// under the lock, the wait itself outside it.
pub struct PacingLimiter {
    min_interval: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl PacingLimiter {
    /// Create a limiter with the 200 ms default interval.
    pub fn new() -> Self {
        Self::with_min_interval(DEFAULT_MIN_INTERVAL)
    }

    /// Create a limiter with a custom interval. Zero disables pacing.
    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the slot map, recovering from poison if necessary.
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.next_slot.lock().unwrap_or_else(|poisoned| {
            warn!("Pacing limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Suspend until at least the minimum interval has elapsed since the
    /// previous call recorded for `provider`, then record this call.
    ///
    /// The slot reservation is atomic with respect to other callers racing
    /// on the same identity; the sleep happens without holding the lock.
    pub async fn wait(&self, provider: &ProviderId) {
        if self.min_interval.is_zero() {
            return;
        }

        let slot = {
            let mut slots = self.lock_slots();
            let now = Instant::now();
            let slot = match slots.get(provider.as_ref()) {
                Some(last) => (*last + self.min_interval).max(now),
                None => now,
            };
            slots.insert(provider.to_string(), slot);
            slot
        };

        let now = Instant::now();
        if slot > now {
            let wait = slot - now;
            debug!(
                "Pacing limiter: waiting {:?} for provider '{}'",
                wait, provider
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for PacingLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_zero_interval_is_a_no_op() {
        let limiter = PacingLimiter::with_min_interval(Duration::ZERO);
        let provider: ProviderId = Cow::Borrowed("yahoo");

        let started = Instant::now();
        for _ in 0..10 {
            limiter.wait(&provider).await;
        }
        assert!(started.elapsed() < Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_consecutive_calls_are_spaced() {
        let limiter = PacingLimiter::with_min_interval(Duration::from_millis(50));
        let provider: ProviderId = Cow::Borrowed("finnhub");

        let started = Instant::now();
        limiter.wait(&provider).await;
        limiter.wait(&provider).await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_distinct_providers_do_not_wait_on_each_other() {
        let limiter = PacingLimiter::with_min_interval(Duration::from_millis(200));

        let started = Instant::now();
        limiter.wait(&Cow::Borrowed("finnhub")).await;
        limiter.wait(&Cow::Borrowed("alphavantage")).await;
        limiter.wait(&Cow::Borrowed("fmp")).await;
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_racing_callers_get_spaced_slots() {
        let limiter = Arc::new(PacingLimiter::with_min_interval(Duration::from_millis(30)));

        let started = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.wait(&Cow::Borrowed("finnhub")).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // Three racers on one identity: first immediate, then two spaced
        // intervals.
        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}
