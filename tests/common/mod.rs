//! Shared test doubles.

#![allow(dead_code)] // not every test binary uses every helper

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use futures::stream::BoxStream;
use futures::StreamExt;

use palaver::error::{PalaverError, Result};
use palaver::provider::{CompletionBackend, CompletionRequest, CompletionResponse};
use palaver::types::{TextStreamDelta, Usage};

/// Scripted backend that captures requests and replays queued responses.
#[derive(Default)]
pub struct MockBackend {
    responses: Mutex<VecDeque<Result<CompletionResponse>>>,
    streams: Mutex<VecDeque<Result<Vec<Result<TextStreamDelta>>>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fail_summaries: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_text(&self, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(CompletionResponse {
                text: text.to_string(),
                usage: Usage::default(),
            }));
    }

    pub fn queue_error(&self, error: PalaverError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Script one streamed reply: the given text deltas followed by `Done`.
    pub fn queue_stream_text(&self, deltas: &[&str], usage: Option<Usage>) {
        let mut script: Vec<Result<TextStreamDelta>> = deltas
            .iter()
            .map(|d| Ok(TextStreamDelta::text_delta(*d)))
            .collect();
        script.push(Ok(TextStreamDelta::done(usage)));
        self.streams.lock().unwrap().push_back(Ok(script));
    }

    /// Script a stream that fails mid-flight after the given deltas.
    pub fn queue_stream_failure(&self, deltas: &[&str], error: PalaverError) {
        let mut script: Vec<Result<TextStreamDelta>> = deltas
            .iter()
            .map(|d| Ok(TextStreamDelta::text_delta(*d)))
            .collect();
        script.push(Err(error));
        self.streams.lock().unwrap().push_back(Ok(script));
    }

    /// Script a failure to open the stream at all.
    pub fn queue_stream_open_error(&self, error: PalaverError) {
        self.streams.lock().unwrap().push_back(Err(error));
    }

    /// Make summarization requests fail so the truncate fallback kicks in.
    pub fn fail_summaries(&self) {
        self.fail_summaries.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn is_summary_request(request: &CompletionRequest) -> bool {
        request
            .system
            .as_deref()
            .is_some_and(|s| s.starts_with("Summarize this conversation"))
    }
}

#[async_trait::async_trait]
impl CompletionBackend for MockBackend {
    fn backend_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if Self::is_summary_request(request) && self.fail_summaries.load(Ordering::SeqCst) {
            return Err(PalaverError::Api {
                status: 500,
                message: "summary backend down".to_string(),
            });
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(CompletionResponse {
                    text: "mock reply".to_string(),
                    usage: Usage::default(),
                })
            })
    }

    async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta>>> {
        self.requests.lock().unwrap().push(request.clone());

        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![Ok(TextStreamDelta::done(None))]));

        script.map(|deltas| futures::stream::iter(deltas).boxed())
    }
}
