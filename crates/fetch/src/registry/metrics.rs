//! Request metrics for health reporting.
//!
//! Counters are dependency-injected into the orchestrator and the admission
//! limiter rather than ambient globals, so tests get a fresh instance per
//! case and hosts can scrape one snapshot per process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Shared counters for fetch activity.
pub struct FetchMetrics {
    started_at: Instant,
    total_requests: AtomicU64,
    error_requests: AtomicU64,
    total_latency_ms: AtomicU64,
    fallback_requests: AtomicU64,
    provider_disables: AtomicU64,
    admission_rejections: AtomicU64,
}

impl FetchMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_requests: AtomicU64::new(0),
            error_requests: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            fallback_requests: AtomicU64::new(0),
            provider_disables: AtomicU64::new(0),
            admission_rejections: AtomicU64::new(0),
        }
    }

    /// Record one completed logical request.
    pub fn record(&self, latency: Duration, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.error_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record that a request was satisfied by a fallback provider.
    pub fn record_fallback(&self) {
        self.fallback_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that a provider was disabled after signalling exhaustion.
    pub fn record_provider_disable(&self) {
        self.provider_disables.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an admission-layer rejection.
    pub fn record_admission_rejection(&self) {
        self.admission_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total_requests.load(Ordering::Relaxed);
        let errors = self.error_requests.load(Ordering::Relaxed);
        let latency = self.total_latency_ms.load(Ordering::Relaxed);
        MetricsSnapshot {
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
            total_requests: total,
            error_rate: if total > 0 {
                errors as f64 / total as f64
            } else {
                0.0
            },
            avg_latency_ms: if total > 0 {
                latency as f64 / total as f64
            } else {
                0.0
            },
            fallback_requests: self.fallback_requests.load(Ordering::Relaxed),
            provider_disables: self.provider_disables.load(Ordering::Relaxed),
            admission_rejections: self.admission_rejections.load(Ordering::Relaxed),
        }
    }
}

impl Default for FetchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot for health endpoints.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: f64,
    pub total_requests: u64,
    pub error_rate: f64,
    pub avg_latency_ms: f64,
    pub fallback_requests: u64,
    pub provider_disables: u64,
    pub admission_rejections: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_instance_is_zeroed() {
        let snapshot = FetchMetrics::new().snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.error_rate, 0.0);
        assert_eq!(snapshot.avg_latency_ms, 0.0);
    }

    #[test]
    fn test_record_tracks_totals_and_error_rate() {
        let metrics = FetchMetrics::new();
        metrics.record(Duration::from_millis(100), true);
        metrics.record(Duration::from_millis(300), false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.error_rate, 0.5);
        assert_eq!(snapshot.avg_latency_ms, 200.0);
    }

    #[test]
    fn test_event_counters() {
        let metrics = FetchMetrics::new();
        metrics.record_fallback();
        metrics.record_provider_disable();
        metrics.record_admission_rejection();
        metrics.record_admission_rejection();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.fallback_requests, 1);
        assert_eq!(snapshot.provider_disables, 1);
        assert_eq!(snapshot.admission_rejections, 2);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = FetchMetrics::new();
        metrics.record(Duration::from_millis(10), true);
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["total_requests"], 1);
    }
}
