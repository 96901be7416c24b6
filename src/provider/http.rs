//! HTTP client construction, SSE parsing, and status mapping.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::error::PalaverError;

/// Build the shared HTTP client, honouring an optional outbound proxy.
///
/// Constructed once per backend and read-only afterwards; all sessions share
/// it.
pub fn build_client(proxy: Option<&str>) -> Result<reqwest::Client, PalaverError> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(10);

    if let Some(url) = proxy {
        let proxy = reqwest::Proxy::all(url)
            .map_err(|e| PalaverError::Configuration(format!("Invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Build Anthropic-style headers (x-api-key).
pub fn anthropic_headers(api_key: &str, version: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(api_key) {
        headers.insert("x-api-key", val);
    }
    if let Ok(val) = HeaderValue::from_str(version) {
        headers.insert("anthropic-version", val);
    }
    headers
}

/// Parse an SSE "data:" line, returning None for "[DONE]".
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data: ")?;
    if data == "[DONE]" {
        return None;
    }
    Some(data)
}

/// Classify an HTTP error status into the dispatch error taxonomy.
///
/// 429 is the transient rate-limit signal the retry policy acts on; 400 is a
/// permanent request-shape error; everything else is generic.
pub fn status_to_error(status: u16, body: &str) -> PalaverError {
    match status {
        429 => PalaverError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        400 => PalaverError::InvalidRequest(body.to_string()),
        _ => PalaverError::Api {
            status,
            message: body.to_string(),
        },
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    // Try to parse retry-after from JSON error body
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}
