//! Chat orchestration: completion client and session engine.

pub mod client;
pub mod engine;

pub use client::CompletionClient;
pub use engine::ChatEngine;
