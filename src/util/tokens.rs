//! Cheap, deterministic token approximation.
//!
//! The remote provider does not expose a tokenizer for arbitrary text, so
//! budget checks and the user-visible usage figure use a word-count heuristic
//! instead. The contract is determinism and cheapness, not accuracy.

use crate::types::Turn;

/// Multiplier applied to the whitespace-separated word count.
const WORDS_TO_TOKENS: f64 = 1.3;

/// Approximate token count for a piece of text, rounded to the nearest whole.
pub fn approx_tokens(text: &str) -> u32 {
    (text.split_whitespace().count() as f64 * WORDS_TO_TOKENS).round() as u32
}

/// Approximate token count summed over a turn list.
pub fn approx_history_tokens(turns: &[Turn]) -> u32 {
    turns.iter().map(|t| approx_tokens(&t.content)).sum()
}

/// Context budget for a model id.
///
/// Also serves as the default reply budget when `MAX_TOKENS` is not set.
pub fn max_model_tokens(model: &str) -> u32 {
    if model.contains("sonnet") {
        8192
    } else {
        4000
    }
}
