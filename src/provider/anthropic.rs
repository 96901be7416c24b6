//! Anthropic Messages API backend.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::config::ChatConfig;
use crate::error::{PalaverError, Result};
use crate::types::{Role, TextStreamDelta, Usage};

use super::http::{anthropic_headers, build_client, parse_sse_data, status_to_error};
use super::{CompletionBackend, CompletionRequest, CompletionResponse};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    user_id: Option<String>,
}

impl AnthropicBackend {
    /// Build a backend from config. The HTTP client (including the optional
    /// outbound proxy) is constructed once and shared by all sessions.
    pub fn new(config: &ChatConfig) -> Result<Self> {
        Ok(Self {
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: build_client(config.proxy.as_deref())?,
            user_id: config.user_id.clone(),
        })
    }

    /// Override the endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        anthropic_headers(&self.api_key, API_VERSION)
    }

    fn build_request_body(&self, request: &CompletionRequest, stream: bool) -> serde_json::Value {
        let mut system_parts: Vec<&str> = request.system.iter().map(|s| s.as_str()).collect();
        let mut messages = Vec::new();

        for turn in &request.messages {
            match turn.role {
                // System turns never belong in the messages payload.
                Role::System => system_parts.push(&turn.content),
                Role::User => messages.push(serde_json::json!({
                    "role": "user",
                    "content": turn.content,
                })),
                Role::Assistant => messages.push(serde_json::json!({
                    "role": "assistant",
                    "content": turn.content,
                })),
            }
        }

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "stream": stream,
        });

        let obj = body.as_object_mut().expect("body is a JSON object");

        if !system_parts.is_empty() {
            obj.insert("system".into(), system_parts.join("\n").into());
        }
        if let Some(top_k) = request.top_k {
            obj.insert("top_k".into(), top_k.into());
        }
        if let Some(top_p) = request.top_p {
            obj.insert("top_p".into(), top_p.into());
        }
        if let Some(ref user_id) = self.user_id {
            obj.insert("metadata".into(), serde_json::json!({ "user_id": user_id }));
        }

        body
    }
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    fn backend_name(&self) -> &str {
        "anthropic"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request_body(request, false);
        let url = format!("{}/messages", self.base_url);

        debug!(model = %self.model, "Anthropic complete");

        let resp = self
            .client
            .post(&url)
            .headers(self.build_headers())
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: AnthropicResponse = resp.json().await?;

        let text = data
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            text,
            usage: Usage {
                input_tokens: data.usage.input_tokens,
                output_tokens: data.usage.output_tokens,
            },
        })
    }

    async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta>>> {
        let body = self.build_request_body(request, true);
        let url = format!("{}/messages", self.base_url);

        debug!(model = %self.model, "Anthropic stream");

        let resp = self
            .client
            .post(&url)
            .headers(self.build_headers())
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = String::new();
            let mut usage = Usage::default();
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(PalaverError::Network(e));
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = parse_sse_data(&line) else {
                        continue;
                    };
                    let Ok(event) = serde_json::from_str::<serde_json::Value>(data) else {
                        continue;
                    };

                    match event.get("type").and_then(|t| t.as_str()).unwrap_or("") {
                        "content_block_delta" => {
                            let text = event
                                .get("delta")
                                .filter(|d| {
                                    d.get("type").and_then(|t| t.as_str())
                                        == Some("text_delta")
                                })
                                .and_then(|d| d.get("text"))
                                .and_then(|t| t.as_str());
                            if let Some(text) = text {
                                yield Ok(TextStreamDelta::text_delta(text));
                            }
                        }
                        "message_start" => {
                            if let Some(input) = event
                                .pointer("/message/usage/input_tokens")
                                .and_then(|v| v.as_u64())
                            {
                                usage.input_tokens = input as u32;
                            }
                        }
                        "message_delta" => {
                            if let Some(output) = event
                                .pointer("/usage/output_tokens")
                                .and_then(|v| v.as_u64())
                            {
                                usage.output_tokens = output as u32;
                            }
                        }
                        "message_stop" => {
                            yield Ok(TextStreamDelta::done(Some(usage)));
                            return;
                        }
                        "error" => {
                            let message = event
                                .pointer("/error/message")
                                .and_then(|m| m.as_str())
                                .unwrap_or("unknown stream error");
                            yield Err(PalaverError::Stream(message.to_string()));
                            return;
                        }
                        _ => {}
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

// Internal Anthropic response types

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Turn;

    fn backend() -> AnthropicBackend {
        AnthropicBackend::new(&ChatConfig::new("test-key")).unwrap()
    }

    #[test]
    fn system_travels_in_its_own_field() {
        let request = CompletionRequest::new(
            Some("be brief".to_string()),
            vec![Turn::user("hello"), Turn::assistant("hi")],
        );
        let body = backend().build_request_body(&request, false);
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["role"], "assistant");
    }

    #[test]
    fn stray_system_turns_are_routed_out_of_messages() {
        let request = CompletionRequest::new(
            None,
            vec![Turn::system("instruction"), Turn::user("hello")],
        );
        let body = backend().build_request_body(&request, false);
        assert_eq!(body["system"], "instruction");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn sampling_options_are_forwarded() {
        let mut request = CompletionRequest::new(None, vec![Turn::user("hello")]);
        request.temperature = 0.4;
        request.max_tokens = 1000;
        request.top_k = Some(5);
        request.top_p = Some(0.9);
        let body = backend().build_request_body(&request, true);
        assert_eq!(body["temperature"], 0.4);
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["top_k"], 5);
        assert_eq!(body["top_p"], 0.9);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn metadata_included_only_when_configured() {
        let request = CompletionRequest::new(None, vec![Turn::user("hello")]);
        let body = backend().build_request_body(&request, false);
        assert!(body.get("metadata").is_none());

        let mut config = ChatConfig::new("test-key");
        config.user_id = Some("user-42".to_string());
        let backend = AnthropicBackend::new(&config).unwrap();
        let body = backend.build_request_body(&request, false);
        assert_eq!(body["metadata"]["user_id"], "user-42");
    }
}
