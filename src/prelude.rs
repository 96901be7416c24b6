//! Convenience re-exports for common use.

pub use crate::chat::{ChatEngine, CompletionClient};
pub use crate::config::ChatConfig;
pub use crate::error::{PalaverError, Result};
pub use crate::i18n::Localizer;
pub use crate::provider::anthropic::AnthropicBackend;
pub use crate::provider::{CompletionBackend, CompletionRequest, CompletionResponse};
pub use crate::session::{SessionId, SessionStore};
pub use crate::types::{
    ChatChunk, ChunkStatus, Role, StreamEventType, TextStreamDelta, Turn, Usage,
};
pub use crate::util::retry::RetryPolicy;
