//! Per-caller admission control for incoming logical requests.
//!
//! Bounds the rate (trailing-window cap per caller identity) and the
//! concurrency (process-wide in-flight cap) of requests before any provider
//! is contacted, independent of which providers they would touch.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::warn;
use thiserror::Error;

use crate::errors::{ErrorCode, ErrorEnvelope};

use super::FetchMetrics;

/// Retry hint when the in-flight cap rejects a request.
const QUEUE_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Floor for the window-cap retry hint.
const MIN_RETRY_AFTER: Duration = Duration::from_millis(100);

/// Admission limits.
#[derive(Clone, Debug)]
pub struct AdmissionConfig {
    /// Maximum requests per caller within the trailing window.
    pub requests_per_minute: u32,
    /// Process-wide cap on requests currently in flight.
    pub queue_limit: u32,
    /// Length of the trailing window. One minute in production; shorter in
    /// tests.
    pub window: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 100,
            queue_limit: 200,
            window: Duration::from_secs(60),
        }
    }
}

/// Rejection raised when a request cannot be admitted.
#[derive(Clone, Debug, Error)]
#[error("Rate limit exceeded")]
pub struct AdmissionRejected {
    /// How long the caller should wait before trying again.
    pub retry_after: Duration,
}

impl AdmissionRejected {
    /// The stable caller-facing error shape for this rejection.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(
            ErrorCode::RateLimit,
            format!(
                "You are being rate-limited. Please retry in {} seconds.",
                self.retry_after.as_secs_f64().ceil() as u64
            ),
        )
    }
}

#[derive(Debug, Default)]
struct AdmissionState {
    windows: HashMap<String, VecDeque<Instant>>,
    inflight: u32,
}

/// Admission limiter shared by every inbound request.
pub struct AdmissionLimiter {
    config: AdmissionConfig,
    state: Mutex<AdmissionState>,
    metrics: Arc<FetchMetrics>,
}

impl AdmissionLimiter {
    /// Create a limiter with default limits and its own metrics instance.
    pub fn new() -> Self {
        Self::with_config(AdmissionConfig::default(), Arc::new(FetchMetrics::new()))
    }

    /// Create a limiter with custom limits and a shared metrics instance.
    pub fn with_config(config: AdmissionConfig, metrics: Arc<FetchMetrics>) -> Self {
        Self {
            config,
            state: Mutex::new(AdmissionState::default()),
            metrics,
        }
    }

    /// Lock the state mutex, recovering from poison if necessary.
    fn lock_state(&self) -> MutexGuard<'_, AdmissionState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Admission limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Admit one request for `caller`.
    ///
    /// On success the returned permit holds the in-flight slot; dropping it
    /// releases the slot exactly once, on every exit path. Window entries
    /// are not removed on release; the window counts admissions, not
    /// completions.
    pub fn acquire(&self, caller: &str) -> Result<AdmissionPermit<'_>, AdmissionRejected> {
        let now = Instant::now();
        let mut state = self.lock_state();

        if state.inflight >= self.config.queue_limit {
            warn!(
                "Admission rejected (queue full): caller={} inflight={}",
                caller, state.inflight
            );
            self.metrics.record_admission_rejection();
            return Err(AdmissionRejected {
                retry_after: QUEUE_RETRY_AFTER,
            });
        }

        let window = state.windows.entry(caller.to_string()).or_default();
        while window
            .front()
            .is_some_and(|first| now.duration_since(*first) >= self.config.window)
        {
            window.pop_front();
        }

        if window.len() >= self.config.requests_per_minute as usize {
            let retry_after = window
                .front()
                .map(|first| self.config.window.saturating_sub(now.duration_since(*first)))
                .unwrap_or(MIN_RETRY_AFTER)
                .max(MIN_RETRY_AFTER);
            warn!(
                "Admission rejected (window cap): caller={} retry_after={:?}",
                caller, retry_after
            );
            self.metrics.record_admission_rejection();
            return Err(AdmissionRejected { retry_after });
        }

        window.push_back(now);
        state.inflight += 1;
        Ok(AdmissionPermit { limiter: self })
    }

    /// Requests currently in flight.
    pub fn inflight(&self) -> u32 {
        self.lock_state().inflight
    }

    fn release(&self) {
        let mut state = self.lock_state();
        state.inflight = state.inflight.saturating_sub(1);
    }
}

impl Default for AdmissionLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// In-flight slot held by an admitted request.
///
/// Dropping the permit releases the slot, including on cancellation.
pub struct AdmissionPermit<'a> {
    limiter: &'a AdmissionLimiter,
}

impl std::fmt::Debug for AdmissionPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionPermit").finish_non_exhaustive()
    }
}

impl Drop for AdmissionPermit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
