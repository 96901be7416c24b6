//! Streaming types.

use serde::{Deserialize, Serialize};

use super::usage::Usage;

/// A delta emitted by a completion backend during streaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStreamDelta {
    /// The incremental text chunk.
    pub text: String,
    /// Event type.
    pub event_type: StreamEventType,
    /// Usage (typically only on the final delta).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl TextStreamDelta {
    /// An incremental text delta.
    pub fn text_delta(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            event_type: StreamEventType::TextDelta,
            usage: None,
        }
    }

    /// The terminal delta, optionally carrying usage.
    pub fn done(usage: Option<Usage>) -> Self {
        Self {
            text: String::new(),
            event_type: StreamEventType::Done,
            usage,
        }
    }
}

/// Type of stream event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    /// Incremental text content.
    TextDelta,
    /// Stream finished.
    Done,
}

/// One element of the chat-level streaming sequence.
///
/// `text` is the *cumulative* reply so far, not a delta. All elements but the
/// last are [`ChunkStatus::InProgress`]; the final element is
/// [`ChunkStatus::Finished`] and carries the approximate token count of the
/// committed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatChunk {
    pub text: String,
    pub status: ChunkStatus,
}

/// Terminal marker distinguishing "more to come" from "final".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    InProgress,
    Finished { tokens: u32 },
}

impl ChatChunk {
    pub fn in_progress(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: ChunkStatus::InProgress,
        }
    }

    pub fn finished(text: impl Into<String>, tokens: u32) -> Self {
        Self {
            text: text.into(),
            status: ChunkStatus::Finished { tokens },
        }
    }

    /// Whether this is the terminal element of the sequence.
    pub fn is_finished(&self) -> bool {
        matches!(self.status, ChunkStatus::Finished { .. })
    }
}
