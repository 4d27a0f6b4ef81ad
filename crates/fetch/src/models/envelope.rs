use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ErrorEnvelope;

/// Attribution note attached to every successful fetch.
pub const DEFAULT_DATA_LICENSE: &str = "Provider terms apply";

/// Uniform result envelope returned by every core operation.
///
/// Exactly one of `data` and `error` is present; `warning` may accompany
/// either. Construct through [`FetchResult::success`] and
/// [`FetchResult::failure`] to keep that invariant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchResult<T> {
    /// The fetched payload, when a provider satisfied the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Display label of the provider that satisfied the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Human note, e.g. that a fallback provider was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Failure detail, present only when `data` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,

    /// When the successful fetch completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,

    /// Attribution: which provider supplied the data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_provider: Option<String>,

    /// Attribution: license terms covering the data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_license: Option<String>,
}

impl<T> FetchResult<T> {
    /// Build a success envelope attributed to the provider behind `label`.
    pub fn success(data: T, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            data: Some(data),
            source: Some(label.clone()),
            warning: None,
            error: None,
            fetched_at: Some(Utc::now()),
            data_provider: Some(label),
            data_license: Some(DEFAULT_DATA_LICENSE.to_string()),
        }
    }

    /// Build a failure envelope.
    pub fn failure(error: ErrorEnvelope) -> Self {
        Self {
            data: None,
            source: None,
            warning: None,
            error: Some(error),
            fetched_at: None,
            data_provider: None,
            data_license: None,
        }
    }

    /// Attach a human-readable note.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// True when the envelope carries data.
    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }
}
