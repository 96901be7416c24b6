//! The session orchestrator.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::debug;

use crate::config::ChatConfig;
use crate::error::Result;
use crate::i18n::Localizer;
use crate::provider::{CompletionBackend, CompletionRequest};
use crate::session::{compress, SessionId, SessionStore};
use crate::types::{ChatChunk, Role, StreamEventType, Turn, Usage};
use crate::util::tokens::approx_history_tokens;

use super::client::CompletionClient;

/// Public-facing core: drives one user turn through load, admit, compress,
/// dispatch, commit and report.
///
/// One `ChatEngine` serves all sessions; the caller must serialize operations
/// per session id (at most one in flight per id).
#[derive(Clone)]
pub struct ChatEngine {
    backend: Arc<dyn CompletionBackend>,
    client: CompletionClient,
    store: SessionStore,
    config: ChatConfig,
    localizer: Localizer,
}

impl ChatEngine {
    pub fn new(config: ChatConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        let store = SessionStore::new(
            config.init_system_content(),
            config.assistant_prompt.clone(),
            config.max_conversation_age_minutes,
        );
        let localizer = Localizer::new(config.bot_language.clone());
        let client = CompletionClient::new(backend.clone(), localizer.clone());
        Self {
            backend,
            client,
            store,
            config,
            localizer,
        }
    }

    /// Access the session store (vision flag lifecycle, introspection).
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Turn count and approximate token count for a session, lazily
    /// initializing it if absent.
    pub fn conversation_stats(&self, id: SessionId) -> (usize, u32) {
        self.store.stats(id)
    }

    /// Replace the session's history with a single system turn.
    pub fn reset_history(&self, id: SessionId, content: Option<&str>) {
        self.store.reset(id, content);
    }

    /// One full user turn: returns the reply text (with the usage suffix when
    /// configured) and the approximate token count of the committed session.
    ///
    /// Dispatch failures propagate without committing an assistant turn; the
    /// admitted user turn stays in history.
    pub async fn chat_response(&self, id: SessionId, query: &str) -> Result<(String, u32)> {
        let request = self.prepare(id, query).await;
        let response = self.client.complete(&request).await?;
        report_usage(&response.usage);

        Ok(self.commit(id, response.text))
    }

    /// Streaming variant: yields every cumulative partial text before the
    /// final element, which carries the committed token count.
    pub fn chat_response_stream(
        &self,
        id: SessionId,
        query: impl Into<String>,
    ) -> BoxStream<'static, Result<ChatChunk>> {
        let engine = self.clone();
        let query = query.into();

        Box::pin(async_stream::stream! {
            let request = engine.prepare(id, &query).await;
            let mut deltas = match engine.client.stream(&request).await {
                Ok(stream) => stream,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let mut answer = String::new();
            let mut usage = Usage::default();
            while let Some(delta) = deltas.next().await {
                let delta = match delta {
                    Ok(d) => d,
                    Err(e) => {
                        // Failed dispatch: nothing is committed.
                        yield Err(e);
                        return;
                    }
                };
                if let Some(partial) = &delta.usage {
                    usage.merge(partial);
                }
                match delta.event_type {
                    StreamEventType::TextDelta => {
                        answer.push_str(&delta.text);
                        yield Ok(ChatChunk::in_progress(answer.clone()));
                    }
                    StreamEventType::Done => report_usage(&usage),
                }
            }

            let answer = answer.trim().to_string();
            let (text, tokens) = engine.commit(id, answer);
            yield Ok(ChatChunk::finished(text, tokens));
        })
    }

    /// Load/admit/compress and build the provider request.
    async fn prepare(&self, id: SessionId, query: &str) -> CompletionRequest {
        self.store.get_or_init(id);
        self.store.touch(id);
        self.store.push(id, Turn::user(query));

        if compress::needs_compression(&self.store.turns(id), &self.config) {
            compress::compress(&*self.backend, &self.store, id, query, &self.config).await;
        }

        let system = self.store.system_content(id);
        let messages: Vec<Turn> = self
            .store
            .turns(id)
            .into_iter()
            .filter(|t| matches!(t.role, Role::User | Role::Assistant))
            .collect();

        let mut request = CompletionRequest::new(system, messages);
        request.temperature = self.config.temperature;
        request.max_tokens = self.config.max_tokens;
        request.top_k = Some(self.config.top_k);
        request.top_p = Some(self.config.top_p);
        request
    }

    /// Commit the assistant turn and compute the post-commit report.
    ///
    /// The usage suffix is cosmetic output only; the committed turn holds the
    /// raw reply. The displayed count deliberately reflects the possibly
    /// compressed history.
    fn commit(&self, id: SessionId, answer: String) -> (String, u32) {
        self.store.push(id, Turn::assistant(answer.clone()));
        let tokens = approx_history_tokens(&self.store.turns(id));

        let text = if self.config.show_usage {
            format!(
                "{answer}\n\n---\n💰 {tokens} {}",
                self.localizer.text("stats_tokens")
            )
        } else {
            answer
        };
        (text, tokens)
    }
}

fn report_usage(usage: &Usage) {
    debug!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        total_tokens = usage.total_tokens(),
        "Provider-reported usage"
    );
}
