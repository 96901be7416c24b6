//! Localized user-facing strings.
//!
//! Translations are embedded at compile time and parsed once. Lookup falls
//! back from the requested language to English, and ultimately to the key
//! itself so a missing entry never fails a dispatch.

use std::collections::HashMap;
use std::sync::OnceLock;

type Translations = HashMap<String, HashMap<String, String>>;

static TRANSLATIONS: OnceLock<Translations> = OnceLock::new();

const FALLBACK_LANGUAGE: &str = "en";

fn translations() -> &'static Translations {
    TRANSLATIONS.get_or_init(|| {
        serde_json::from_str(include_str!("translations.json"))
            .expect("embedded translations.json is valid")
    })
}

/// Return the translated text for `key` in `language`.
pub fn localized_text(key: &str, language: &str) -> String {
    let table = translations();

    if let Some(text) = table.get(language).and_then(|entries| entries.get(key)) {
        return text.clone();
    }
    tracing::warn!(language, key, "No translation available");

    if let Some(text) = table
        .get(FALLBACK_LANGUAGE)
        .and_then(|entries| entries.get(key))
    {
        return text.clone();
    }
    tracing::warn!(key, "No english definition found for key");

    key.to_string()
}

/// Lookup handle bound to a configured language.
#[derive(Debug, Clone)]
pub struct Localizer {
    language: String,
}

impl Localizer {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn text(&self, key: &str) -> String {
        localized_text(key, &self.language)
    }
}
