//! Ordered-fallback execution across unreliable providers.
//!
//! Walks a fixed attempt list applying the circuit breaker, the pacing
//! limiter, and error classification, stopping at the first attempt that
//! produces data. Individual provider failures never escape; callers see
//! either data or one fixed, sanitized failure message.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::errors::{is_rate_limit_exhaustion, ErrorCode, ErrorEnvelope};
use crate::models::FetchResult;
use crate::provider::ProviderAttempt;

use super::{CircuitBreaker, FetchMetrics, PacingLimiter};

/// Warning attached when an earlier attempt did not satisfy the request.
pub const FALLBACK_WARNING: &str = "Used fallback provider due to upstream issue.";

/// The single failure message callers see when no provider produced data.
pub const ALL_PROVIDERS_UNAVAILABLE: &str =
    "All data providers for this operation are currently unavailable. Please try again later.";

/// Default cooldown for a provider that signalled exhaustion.
const DEFAULT_DISABLE_COOLDOWN: Duration = Duration::from_secs(60 * 60 * 24);

/// Orchestrator tuning.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Cooldown for providers without an override.
    pub default_cooldown: Duration,
    /// Per-provider cooldown overrides, keyed by provider identity.
    pub cooldown_overrides: HashMap<String, Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_cooldown: DEFAULT_DISABLE_COOLDOWN,
            cooldown_overrides: HashMap::new(),
        }
    }
}

impl OrchestratorConfig {
    fn cooldown_for(&self, provider: &str) -> Duration {
        self.cooldown_overrides
            .get(provider)
            .copied()
            .unwrap_or(self.default_cooldown)
    }
}

/// Ordered-fallback orchestrator shared by every logical operation.
///
/// # Example
///
/// ```ignore
/// use marketgate_fetch::{FallbackOrchestrator, ProviderAttempt};
///
/// let orchestrator = FallbackOrchestrator::new();
/// let attempts = vec![
///     ProviderAttempt::new("finnhub", "Finnhub", move || finnhub.quote(&symbol)),
///     ProviderAttempt::new("yahoo", "Yahoo Finance", move || yahoo.quote(&symbol)),
/// ];
/// let result = orchestrator.execute("get_quote", "AAPL", &attempts).await;
/// ```
pub struct FallbackOrchestrator {
    circuit_breaker: Arc<CircuitBreaker>,
    pacing: Arc<PacingLimiter>,
    metrics: Arc<FetchMetrics>,
    config: OrchestratorConfig,
}

impl FallbackOrchestrator {
    /// Create an orchestrator with default pacing, cooldowns, and a fresh
    /// metrics instance.
    pub fn new() -> Self {
        Self::with_config(
            OrchestratorConfig::default(),
            Arc::new(CircuitBreaker::new()),
            Arc::new(PacingLimiter::new()),
            Arc::new(FetchMetrics::new()),
        )
    }

    /// Create an orchestrator around shared collaborators.
    pub fn with_config(
        config: OrchestratorConfig,
        circuit_breaker: Arc<CircuitBreaker>,
        pacing: Arc<PacingLimiter>,
        metrics: Arc<FetchMetrics>,
    ) -> Self {
        Self {
            circuit_breaker,
            pacing,
            metrics,
            config,
        }
    }

    /// The breaker consulted before every attempt, for health reporting.
    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    /// The injected metrics instance.
    pub fn metrics(&self) -> &Arc<FetchMetrics> {
        &self.metrics
    }

    /// Execute `attempts` strictly in order and return the first success.
    ///
    /// For each attempt: a provider inside its disable window is skipped
    /// without any call or pacing cost; otherwise the pacing limiter runs,
    /// then the adapter. A value returns immediately, attributed to this
    /// attempt's label, with a fallback warning iff an earlier attempt was
    /// skipped, absent, or failed. An absent result moves on to the next
    /// attempt. A classified failure moves on too; when it classifies as
    /// quota exhaustion the provider is first disabled for its cooldown.
    /// When every attempt is spent the caller gets one fixed failure
    /// envelope carrying no upstream detail.
    ///
    /// `operation` and `subject` identify the logical request in logs only.
    pub async fn execute<T>(
        &self,
        operation: &str,
        subject: &str,
        attempts: &[ProviderAttempt<T>],
    ) -> FetchResult<T> {
        let started = Instant::now();
        let mut had_fallback = false;

        for attempt in attempts {
            if self.circuit_breaker.is_disabled(attempt.key()) {
                had_fallback = true;
                debug!(
                    "provider skipped (disabled window): op={} subject={} provider={}",
                    operation,
                    subject,
                    attempt.key()
                );
                continue;
            }

            self.pacing.wait(attempt.key()).await;

            let attempt_started = Instant::now();
            match attempt.invoke().await {
                Ok(Some(value)) => {
                    debug!(
                        "provider attempt complete: op={} subject={} provider={} success=true latency_ms={}",
                        operation,
                        subject,
                        attempt.key(),
                        attempt_started.elapsed().as_millis()
                    );
                    self.metrics.record(started.elapsed(), true);
                    let result = FetchResult::success(value, attempt.label());
                    if had_fallback {
                        self.metrics.record_fallback();
                        return result.with_warning(FALLBACK_WARNING);
                    }
                    return result;
                }
                Ok(None) => {
                    had_fallback = true;
                    debug!(
                        "provider attempt complete: op={} subject={} provider={} success=false latency_ms={}",
                        operation,
                        subject,
                        attempt.key(),
                        attempt_started.elapsed().as_millis()
                    );
                }
                Err(error) => {
                    had_fallback = true;
                    warn!(
                        "provider attempt failed: op={} subject={} provider={} code={} status={:?} latency_ms={}",
                        operation,
                        subject,
                        attempt.key(),
                        error.code,
                        error.status,
                        attempt_started.elapsed().as_millis()
                    );
                    if is_rate_limit_exhaustion(&error) {
                        let cooldown = self.config.cooldown_for(attempt.key().as_ref());
                        let until = self.circuit_breaker.disable(attempt.key(), cooldown);
                        self.metrics.record_provider_disable();
                        warn!(
                            "provider disabled after rate limit: op={} subject={} provider={} resumes_in={:?}",
                            operation,
                            subject,
                            attempt.key(),
                            until.saturating_duration_since(Instant::now())
                        );
                    }
                }
            }
        }

        self.metrics.record(started.elapsed(), false);
        FetchResult::failure(ErrorEnvelope::new(
            ErrorCode::Upstream,
            ALL_PROVIDERS_UNAVAILABLE,
        ))
    }
}

impl Default for FallbackOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
