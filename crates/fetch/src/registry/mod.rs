//! Fetch orchestration registry.
//!
//! This module provides the machinery that turns an ordered list of
//! unreliable providers into one dependable logical operation:
//! - Circuit breaking for providers that signalled exhaustion
//! - Pacing between consecutive calls to one provider
//! - Admission control for inbound requests
//! - The ordered-fallback orchestrator itself
//! - Injected metrics for health reporting

mod admission;
mod circuit_breaker;
mod metrics;
mod orchestrator;
mod pacing;

pub use admission::{AdmissionConfig, AdmissionLimiter, AdmissionPermit, AdmissionRejected};
pub use circuit_breaker::{CircuitBreaker, DisabledWindow};
pub use metrics::{FetchMetrics, MetricsSnapshot};
pub use orchestrator::{
    FallbackOrchestrator, OrchestratorConfig, ALL_PROVIDERS_UNAVAILABLE, FALLBACK_WARNING,
};
pub use pacing::PacingLimiter;
