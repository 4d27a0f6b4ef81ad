//! Marketgate Fetch Crate
//!
//! This crate turns an ordered list of independent, unreliable, rate-limited
//! upstream data providers into one dependable logical operation. It fetches
//! normalized domain data (quotes, candles, profiles, news) on behalf of
//! callers, attributes which provider satisfied each request, and avoids
//! hammering a provider that has just signalled exhaustion.
//!
//! # Overview
//!
//! The crate supports:
//! - Ordered fallback across providers, stopping at the first success
//! - Per-provider circuit breaking after quota exhaustion
//! - Per-provider pacing between consecutive upstream calls
//! - Per-caller admission control before any provider is contacted
//! - A short-lived TTL cache for result envelopes
//!
//! # Architecture
//!
//! ```text
//! +----------+     +--------------------+     +-----------------+
//! |  Caller  | --> | Admission Limiter  | --> |  ExpiringCache  |
//! +----------+     +--------------------+     +-----------------+
//!                                                      |  miss
//!                                                      v
//!                                         +------------------------+
//!                                         |  FallbackOrchestrator  |
//!                                         +------------------------+
//!                                             |         |        |
//!                                             v         v        v
//!                                      +---------+ +--------+ +---------+
//!                                      | Circuit | | Pacing | | Adapter |
//!                                      | Breaker | | Limiter| |  call   |
//!                                      +---------+ +--------+ +---------+
//!                                                      |
//!                                                      v
//!                                            +-----------------+
//!                                            |  FetchResult<T> |
//!                                            +-----------------+
//! ```
//!
//! Provider adapters are external collaborators: each is an async callable
//! that either returns a normalized value, reports that it has no data for
//! the subject, or fails with a classified [`ProviderError`]. Transport and
//! parsing detail never enters this crate.
//!
//! # Core Types
//!
//! - [`ProviderAttempt`] - one entry in an ordered fallback list
//! - [`FetchAdapter`] - the adapter contract behind each attempt
//! - [`FetchResult`] - the uniform success/failure envelope
//! - [`ErrorEnvelope`] / [`ErrorCode`] - sanitized failure shape
//! - [`FallbackOrchestrator`] - walks the attempt list
//! - [`CircuitBreaker`] - per-provider disable windows
//! - [`PacingLimiter`] - per-provider minimum call spacing
//! - [`AdmissionLimiter`] - per-caller request admission
//! - [`ExpiringCache`] - TTL cache for envelopes

pub mod cache;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod service;

// Re-export the cache type
pub use cache::ExpiringCache;

// Re-export error types
pub use errors::{
    is_rate_limit_exhaustion, map_status_to_code, ErrorCode, ErrorEnvelope, ProviderError,
    RATE_LIMIT_PATTERNS,
};

// Re-export model types
pub use models::{FetchResult, DEFAULT_DATA_LICENSE};

// Re-export provider types
pub use provider::{FetchAdapter, ProviderAttempt, ProviderId};

// Re-export registry types
pub use registry::{
    AdmissionConfig, AdmissionLimiter, AdmissionPermit, AdmissionRejected, CircuitBreaker,
    DisabledWindow, FallbackOrchestrator, FetchMetrics, MetricsSnapshot, OrchestratorConfig,
    PacingLimiter, ALL_PROVIDERS_UNAVAILABLE, FALLBACK_WARNING,
};

// Re-export combinators
pub use service::with_cache;
