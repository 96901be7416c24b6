//! Palaver — per-conversation session core for chat bots.
//!
//! Sits between a chat front-end and a remote completion endpoint: keeps
//! bounded conversation state per session, compresses history when it
//! outgrows the model context, dispatches completions (streaming or not) with
//! bounded retry on rate limits, and folds the reply back into the session.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use palaver::prelude::*;
//!
//! # async fn example() -> palaver::error::Result<()> {
//! let config = ChatConfig::from_env()?;
//! let backend = Arc::new(AnthropicBackend::new(&config)?);
//! let engine = ChatEngine::new(config, backend);
//!
//! let (reply, tokens) = engine.chat_response(42, "Hello!").await?;
//! println!("{reply} ({tokens} tokens)");
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod config;
pub mod error;
pub mod i18n;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod types;
pub mod util;
