//! Completion backend trait and implementations.

pub mod anthropic;
pub mod http;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::{TextStreamDelta, Turn, Usage};

/// A completion request sent to the remote model.
///
/// `system` travels in its own channel; `messages` must contain only user and
/// assistant turns.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub messages: Vec<Turn>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_k: Option<u32>,
    pub top_p: Option<f64>,
}

impl CompletionRequest {
    /// Request with only the required fields set.
    pub fn new(system: Option<String>, messages: Vec<Turn>) -> Self {
        Self {
            system,
            messages,
            temperature: 1.0,
            max_tokens: 1024,
            top_k: None,
            top_p: None,
        }
    }
}

/// Full (non-streaming) reply from a backend.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: Usage,
}

/// The remote completion capability.
///
/// Implementations surface failures through the closed error taxonomy:
/// a rate-limit condition, an invalid-request condition, or a generic failure.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Backend name (e.g., "anthropic").
    fn backend_name(&self) -> &str;

    /// The model id this backend instance serves.
    fn model_id(&self) -> &str;

    /// Produce a full reply (blocking until complete).
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// Produce a lazy, finite, non-restartable stream of deltas, terminated
    /// by a `Done` event that may carry usage.
    async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta>>>;
}
