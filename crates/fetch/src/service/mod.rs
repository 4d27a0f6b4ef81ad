//! Result combinators shared by the higher-level operations.
//!
//! [`with_cache`] memoizes an orchestrator call behind the expiring cache;
//! the [`ttl`] constants carry the per-operation cache lifetimes.

use std::future::Future;
use std::time::Duration;

use log::debug;

use crate::cache::ExpiringCache;
use crate::models::FetchResult;

/// Cache lifetimes per logical operation.
pub mod ttl {
    use std::time::Duration;

    /// Real-time quotes go stale quickly.
    pub const QUOTE: Duration = Duration::from_secs(15);
    /// Candle history.
    pub const CANDLES: Duration = Duration::from_secs(60);
    /// News feeds.
    pub const NEWS: Duration = Duration::from_secs(300);
    /// Company profiles and fundamentals.
    pub const FUNDAMENTALS: Duration = Duration::from_secs(3600);
}

/// Memoize `producer` behind `cache` under `cache_key`.
///
/// A hit returns the stored envelope unchanged. On a miss the producer runs
/// and only success envelopes are stored; failure envelopes are recomputed
/// on every call.
pub async fn with_cache<T, F, Fut>(
    cache: &ExpiringCache<FetchResult<T>>,
    cache_key: &str,
    ttl: Option<Duration>,
    producer: F,
) -> FetchResult<T>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = FetchResult<T>>,
{
    if let Some(hit) = cache.get(cache_key) {
        debug!("cache hit: key={}", cache_key);
        return hit;
    }

    let result = producer().await;
    if result.is_success() {
        cache.set(cache_key, result.clone(), ttl);
    }
    result
}
