//! Provider attempt definitions.
//!
//! This module defines the seam between the orchestrator and the
//! per-provider adapters: the [`FetchAdapter`] contract and the
//! [`ProviderAttempt`] entries that make up an ordered fallback list.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ProviderError;

/// Type alias for provider identifier.
pub type ProviderId = Cow<'static, str>;

/// Contract for a single fetch attempt against one upstream provider.
///
/// Implementations are opaque to the orchestrator: given the request
/// parameters captured at construction, either produce a normalized value,
/// report that the provider has no data for the subject (`Ok(None)`, not an
/// error), or fail with a classified [`ProviderError`]. Transport detail,
/// per-call deadlines, and any retries within one call are the adapter's
/// own concern.
#[async_trait]
pub trait FetchAdapter<T>: Send + Sync {
    async fn fetch(&self) -> Result<Option<T>, ProviderError>;
}

#[async_trait]
impl<T, F, Fut> FetchAdapter<T> for F
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<T>, ProviderError>> + Send + 'static,
{
    async fn fetch(&self) -> Result<Option<T>, ProviderError> {
        (self)().await
    }
}

/// One entry in an ordered fallback list.
///
/// The position of an attempt in the supplied list is its fallback priority;
/// the orchestrator never reorders attempts at runtime. Lists are built once
/// per logical operation from whichever providers are configured at startup.
pub struct ProviderAttempt<T> {
    key: ProviderId,
    label: Cow<'static, str>,
    adapter: Arc<dyn FetchAdapter<T>>,
}

impl<T> ProviderAttempt<T> {
    /// Create an attempt for the provider identified by `key`, attributed
    /// to callers as `label`.
    pub fn new(
        key: impl Into<ProviderId>,
        label: impl Into<Cow<'static, str>>,
        adapter: impl FetchAdapter<T> + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            adapter: Arc::new(adapter),
        }
    }

    /// Stable identity of the provider, shared across operations.
    pub fn key(&self) -> &ProviderId {
        &self.key
    }

    /// Human-facing label used for attribution.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) async fn invoke(&self) -> Result<Option<T>, ProviderError> {
        self.adapter.fetch().await
    }
}

impl<T> std::fmt::Debug for ProviderAttempt<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAttempt")
            .field("key", &self.key)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[tokio::test]
    async fn test_attempt_from_closure() {
        let attempt = ProviderAttempt::new("yahoo", "Yahoo Finance", || async {
            Ok(Some("quote".to_string()))
        });

        assert_eq!(attempt.key().as_ref(), "yahoo");
        assert_eq!(attempt.label(), "Yahoo Finance");
        assert_eq!(attempt.invoke().await.unwrap(), Some("quote".to_string()));
    }

    #[tokio::test]
    async fn test_attempt_propagates_absent_and_errors() {
        let absent: ProviderAttempt<String> =
            ProviderAttempt::new("finnhub", "Finnhub", || async { Ok(None) });
        assert_eq!(absent.invoke().await.unwrap(), None);

        let failing: ProviderAttempt<String> = ProviderAttempt::new("fmp", "FMP", || async {
            Err(ProviderError::new(ErrorCode::Auth, "Credentials rejected."))
        });
        let error = failing.invoke().await.unwrap_err();
        assert_eq!(error.code, ErrorCode::Auth);
    }

    #[test]
    fn test_attempt_debug_omits_adapter() {
        let attempt: ProviderAttempt<u8> =
            ProviderAttempt::new("sec", "SEC EDGAR", || async { Ok(None) });
        let rendered = format!("{:?}", attempt);
        assert!(rendered.contains("sec"));
        assert!(rendered.contains("SEC EDGAR"));
    }
}
