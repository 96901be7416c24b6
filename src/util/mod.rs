//! Utility modules: retry, timeout, token approximation.

pub mod retry;
pub mod timeout;
pub mod tokens;
