//! Chat configuration (env-layered via dotenv).

use crate::error::{PalaverError, Result};
use crate::util::tokens::max_model_tokens;

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_ASSISTANT_PROMPT: &str =
    "You are Claude, a helpful AI assistant created by Anthropic.";

/// Static options consumed at construction; read-only afterwards.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    /// Optional outbound HTTP proxy URL.
    pub proxy: Option<String>,
    pub model: String,
    pub temperature: f64,
    /// Reply budget per completion.
    pub max_tokens: u32,
    pub top_k: u32,
    pub top_p: f64,
    /// Language code used for localized user-facing strings.
    pub bot_language: String,
    /// Append a usage suffix to returned replies.
    pub show_usage: bool,
    /// Maximum turns kept before compression triggers.
    pub max_history_size: usize,
    /// Sessions idle longer than this are reinitialized on next access.
    pub max_conversation_age_minutes: i64,
    /// Default content for the seeded system turn.
    pub assistant_prompt: String,
    /// Overrides `assistant_prompt` for lazy initialization when set.
    pub system_prompt: Option<String>,
    /// Opaque end-user identifier forwarded to the provider when set.
    pub user_id: Option<String>,
}

impl ChatConfig {
    /// Config with the documented defaults for everything but the API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let model = DEFAULT_MODEL.to_string();
        let max_tokens = max_model_tokens(&model);
        Self {
            api_key: api_key.into(),
            proxy: None,
            model,
            temperature: 0.7,
            max_tokens,
            top_k: 1,
            top_p: 0.7,
            bot_language: "en".to_string(),
            show_usage: false,
            max_history_size: 15,
            max_conversation_age_minutes: 180,
            assistant_prompt: DEFAULT_ASSISTANT_PROMPT.to_string(),
            system_prompt: None,
            user_id: None,
        }
    }

    /// Load from environment variables, reading `.env` if present.
    ///
    /// `ANTHROPIC_API_KEY` is required; everything else falls back to the
    /// documented defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| PalaverError::Configuration("Missing ANTHROPIC_API_KEY".into()))?;

        let mut config = Self::new(api_key);

        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            config.max_tokens = max_model_tokens(&model);
            config.model = model;
        }
        if let Ok(val) = std::env::var("PROXY") {
            config.proxy = Some(val);
        }
        if let Some(val) = parse_env("TEMPERATURE") {
            config.temperature = val;
        }
        if let Some(val) = parse_env("MAX_TOKENS") {
            config.max_tokens = val;
        }
        if let Some(val) = parse_env("TOP_K") {
            config.top_k = val;
        }
        if let Some(val) = parse_env("TOP_P") {
            config.top_p = val;
        }
        if let Ok(val) = std::env::var("BOT_LANGUAGE") {
            config.bot_language = val;
        }
        if let Ok(val) = std::env::var("SHOW_USAGE") {
            config.show_usage = val.eq_ignore_ascii_case("true");
        }
        if let Some(val) = parse_env("MAX_HISTORY_SIZE") {
            config.max_history_size = val;
        }
        if let Some(val) = parse_env("MAX_CONVERSATION_AGE_MINUTES") {
            config.max_conversation_age_minutes = val;
        }
        if let Ok(val) = std::env::var("ASSISTANT_PROMPT") {
            config.assistant_prompt = val;
        }
        if let Ok(val) = std::env::var("SYSTEM_PROMPT") {
            config.system_prompt = Some(val);
        }
        if let Ok(val) = std::env::var("USER_ID") {
            config.user_id = Some(val);
        }

        Ok(config)
    }

    /// Content used to seed the system turn on lazy initialization.
    pub fn init_system_content(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(&self.assistant_prompt)
    }

    /// Context budget for the configured model.
    pub fn max_model_tokens(&self) -> u32 {
        max_model_tokens(&self.model)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
