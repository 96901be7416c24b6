//! History compression: summarize, or truncate as a last line of defense.

use tracing::warn;

use crate::config::ChatConfig;
use crate::provider::{CompletionBackend, CompletionRequest};
use crate::types::Turn;
use crate::util::tokens::approx_history_tokens;

use super::store::{SessionId, SessionStore};

const SUMMARY_SYSTEM_PROMPT: &str = "Summarize this conversation in 700 characters or less";
const SUMMARY_TEMPERATURE: f64 = 0.4;
const SUMMARY_MAX_TOKENS: u32 = 1000;

/// Whether the history must be shrunk before the next dispatch.
///
/// True when the approximate prompt tokens plus the reply budget would not
/// fit the model's context, or the turn count exceeds the configured bound.
pub fn needs_compression(turns: &[Turn], config: &ChatConfig) -> bool {
    approx_history_tokens(turns) + config.max_tokens > config.max_model_tokens()
        || turns.len() > config.max_history_size
}

/// Shrink a session that has already admitted `query` as its newest turn.
///
/// Primary path asks the model for a summary of everything before the pending
/// query and rebuilds the session as `{system, summary, query}`. If that
/// fails for any reason the session is truncated to the most recent
/// `max_history_size` turns instead; the pending query is part of that suffix,
/// so nothing is re-appended. This function never fails.
pub async fn compress(
    backend: &dyn CompletionBackend,
    store: &SessionStore,
    id: SessionId,
    query: &str,
    config: &ChatConfig,
) {
    let turns = store.turns(id);
    match summarize(backend, &turns[..turns.len() - 1]).await {
        Ok(summary) => {
            let system_content = store.system_content(id);
            store.reset(id, system_content.as_deref());
            store.push(id, Turn::assistant(summary));
            store.push(id, Turn::user(query));
        }
        Err(e) => {
            warn!(error = %e, "Error summarising chat history, truncating instead");
            store.truncate_to_suffix(id, config.max_history_size);
        }
    }
}

/// Ask the model for a compact summary of the given turns.
async fn summarize(
    backend: &dyn CompletionBackend,
    turns: &[Turn],
) -> crate::error::Result<String> {
    let rendered = serde_json::to_string(turns)?;
    let mut request = CompletionRequest::new(
        Some(SUMMARY_SYSTEM_PROMPT.to_string()),
        vec![Turn::user(rendered)],
    );
    request.temperature = SUMMARY_TEMPERATURE;
    request.max_tokens = SUMMARY_MAX_TOKENS;

    let response = backend.complete(&request).await?;
    Ok(response.text)
}
