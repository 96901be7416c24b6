//! Dispatch wrapper: bounded retry plus error localization.

use std::sync::Arc;

use futures::stream::BoxStream;
use tracing::debug;

use crate::error::{PalaverError, Result};
use crate::i18n::Localizer;
use crate::provider::{CompletionBackend, CompletionRequest, CompletionResponse};
use crate::types::TextStreamDelta;
use crate::util::retry::RetryPolicy;

/// Wraps the raw backend with the dispatch failure policy.
///
/// Rate limits are retried on a fixed schedule and, when exhausted, surfaced
/// unchanged so callers can apply their own backoff. Every other failure is
/// rendered into a localized, user-displayable message before it crosses the
/// orchestrator boundary.
#[derive(Clone)]
pub struct CompletionClient {
    backend: Arc<dyn CompletionBackend>,
    retry: RetryPolicy,
    localizer: Localizer,
}

impl CompletionClient {
    pub fn new(backend: Arc<dyn CompletionBackend>, localizer: Localizer) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
            localizer,
        }
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Full (non-streaming) completion.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        debug!(
            backend = self.backend.backend_name(),
            model = self.backend.model_id(),
            "Dispatching completion"
        );
        self.retry
            .execute(|| self.backend.complete(request))
            .await
            .map_err(|e| self.localize(e))
    }

    /// Open a completion stream. Retry applies to opening the stream, not to
    /// failures after the first delta.
    pub async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta>>> {
        debug!(
            backend = self.backend.backend_name(),
            model = self.backend.model_id(),
            "Opening completion stream"
        );
        self.retry
            .execute(|| self.backend.stream(request))
            .await
            .map_err(|e| self.localize(e))
    }

    fn localize(&self, error: PalaverError) -> PalaverError {
        if error.is_rate_limited() {
            return error;
        }
        let (key, detail) = match &error {
            PalaverError::InvalidRequest(detail) => ("invalid_request", detail.clone()),
            other => ("error", other.to_string()),
        };
        PalaverError::ChatFailed(format!(
            "⚠️ _{}._ ⚠️\n{}",
            self.localizer.text(key),
            detail
        ))
    }
}
