//! Token usage reporting types.

use serde::{Deserialize, Serialize};

/// Provider-reported token usage for a completion.
///
/// Carried for observability; the figures shown to end users come from the
/// cheap word-count approximation in [`crate::util::tokens`], not from here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    /// Merge another usage into this one (accumulate).
    pub fn merge(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}
