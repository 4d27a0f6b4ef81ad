//! Per-provider disable windows for fault tolerance.
//!
//! When a provider signals quota exhaustion, the orchestrator disables it
//! for a cooldown window instead of hammering it again. The breaker tracks
//! one disabled-until instant per provider identity; state is in-memory and
//! resets on application restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::provider::ProviderId;

/// Floor for disable windows. Shorter values are clamped up.
const MIN_DISABLE_TTL: Duration = Duration::from_millis(1);

/// Remaining disable window for one provider, for health reporting.
#[derive(Clone, Debug)]
pub struct DisabledWindow {
    /// Provider identity.
    pub provider: String,
    /// Time left until the provider is eligible again.
    pub remaining: Duration,
}

/// Per-provider circuit breaker.
///
/// Thread-safe map of disabled-until instants. A provider with no entry, or
/// an entry in the past, is enabled; expired entries are purged on read.
pub struct CircuitBreaker {
    disabled_until: Mutex<HashMap<String, Instant>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self {
            disabled_until: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the state mutex, recovering from poison if necessary.
    ///
    /// Worst case after recovery is a slightly stale disable window, which
    /// is better than panicking.
    fn lock_state(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.disabled_until.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// True iff the provider has a disable window still in the future.
    ///
    /// A window in the past reads as enabled and is purged.
    pub fn is_disabled(&self, provider: &ProviderId) -> bool {
        let now = Instant::now();
        let mut state = self.lock_state();
        match state.get(provider.as_ref()) {
            Some(until) if *until <= now => {
                state.remove(provider.as_ref());
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Disable the provider for `ttl` from now and return the effective
    /// disabled-until instant.
    ///
    /// Monotonic: while a window is already open, a second disable only
    /// extends it, never shortens it.
    pub fn disable(&self, provider: &ProviderId, ttl: Duration) -> Instant {
        let until = Instant::now() + ttl.max(MIN_DISABLE_TTL);
        let mut state = self.lock_state();
        let entry = state.entry(provider.to_string()).or_insert(until);
        if *entry < until {
            *entry = until;
        }
        let effective = *entry;
        drop(state);

        info!(
            "Circuit breaker: provider '{}' disabled for {:?}",
            provider, ttl
        );
        effective
    }

    /// The instant the provider becomes eligible again, when a window is
    /// open.
    pub fn disabled_until(&self, provider: &ProviderId) -> Option<Instant> {
        let now = Instant::now();
        let state = self.lock_state();
        state
            .get(provider.as_ref())
            .copied()
            .filter(|until| *until > now)
    }

    /// Re-enable one provider.
    pub fn reset(&self, provider: &ProviderId) {
        let mut state = self.lock_state();
        if state.remove(provider.as_ref()).is_some() {
            info!("Circuit breaker: manually re-enabled provider '{}'", provider);
        }
    }

    /// Re-enable every provider.
    pub fn reset_all(&self) {
        self.lock_state().clear();
        info!("Circuit breaker: all providers re-enabled");
    }

    /// Providers with an open disable window and the time remaining on each.
    pub fn snapshot(&self) -> Vec<DisabledWindow> {
        let now = Instant::now();
        let state = self.lock_state();
        state
            .iter()
            .filter(|(_, until)| **until > now)
            .map(|(provider, until)| DisabledWindow {
                provider: provider.clone(),
                remaining: *until - now,
            })
            .collect()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn test_provider_starts_enabled() {
        let breaker = CircuitBreaker::new();
        let provider: ProviderId = Cow::Borrowed("finnhub");

        assert!(!breaker.is_disabled(&provider));
        assert!(breaker.disabled_until(&provider).is_none());
    }

    #[test]
    fn test_disable_opens_window() {
        let breaker = CircuitBreaker::new();
        let provider: ProviderId = Cow::Borrowed("alphavantage");

        breaker.disable(&provider, Duration::from_secs(60));
        assert!(breaker.is_disabled(&provider));
        assert!(breaker.disabled_until(&provider).is_some());
    }

    #[test]
    fn test_window_expires_and_is_purged() {
        let breaker = CircuitBreaker::new();
        let provider: ProviderId = Cow::Borrowed("fmp");

        breaker.disable(&provider, Duration::from_millis(10));
        assert!(breaker.is_disabled(&provider));

        std::thread::sleep(Duration::from_millis(25));
        assert!(!breaker.is_disabled(&provider));
        assert!(breaker.disabled_until(&provider).is_none());
        assert!(breaker.snapshot().is_empty());
    }

    #[test]
    fn test_disable_is_monotonic() {
        let breaker = CircuitBreaker::new();
        let provider: ProviderId = Cow::Borrowed("twelvedata");

        let first = breaker.disable(&provider, Duration::from_secs(3600));
        // A shorter disable while the window is open must not shrink it.
        let second = breaker.disable(&provider, Duration::from_millis(1));
        assert_eq!(second, first);

        // A longer disable extends it.
        let third = breaker.disable(&provider, Duration::from_secs(7200));
        assert!(third > first);
    }

    #[test]
    fn test_zero_ttl_is_clamped() {
        let breaker = CircuitBreaker::new();
        let provider: ProviderId = Cow::Borrowed("marketstack");

        let until = breaker.disable(&provider, Duration::ZERO);
        assert!(until > Instant::now() - Duration::from_millis(1));
    }

    #[test]
    fn test_reset_re_enables_provider() {
        let breaker = CircuitBreaker::new();
        let provider: ProviderId = Cow::Borrowed("newsapi");

        breaker.disable(&provider, Duration::from_secs(60));
        breaker.reset(&provider);
        assert!(!breaker.is_disabled(&provider));
    }

    #[test]
    fn test_provider_isolation() {
        let breaker = CircuitBreaker::new();
        let disabled: ProviderId = Cow::Borrowed("fred");
        let enabled: ProviderId = Cow::Borrowed("yahoo");

        breaker.disable(&disabled, Duration::from_secs(60));
        assert!(breaker.is_disabled(&disabled));
        assert!(!breaker.is_disabled(&enabled));
    }

    #[test]
    fn test_snapshot_reports_remaining_windows() {
        let breaker = CircuitBreaker::new();
        breaker.disable(&Cow::Borrowed("finnhub"), Duration::from_secs(60));
        breaker.disable(&Cow::Borrowed("fmp"), Duration::from_secs(120));

        let snapshot = breaker.snapshot();
        assert_eq!(snapshot.len(), 2);
        let fmp = snapshot.iter().find(|w| w.provider == "fmp").unwrap();
        assert!(fmp.remaining > Duration::from_secs(60));
    }
}
