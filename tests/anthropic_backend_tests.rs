//! HTTP-level tests for the Anthropic backend against a mock server.

use futures::StreamExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use palaver::config::ChatConfig;
use palaver::error::PalaverError;
use palaver::provider::anthropic::AnthropicBackend;
use palaver::provider::{CompletionBackend, CompletionRequest};
use palaver::types::{StreamEventType, Turn};

fn backend_for(server: &MockServer) -> AnthropicBackend {
    AnthropicBackend::new(&ChatConfig::new("test-key"))
        .unwrap()
        .with_base_url(server.uri())
}

fn request() -> CompletionRequest {
    CompletionRequest::new(Some("be brief".to_string()), vec![Turn::user("hello")])
}

#[tokio::test]
async fn complete_parses_text_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(serde_json::json!({
            "system": "be brief",
            "stream": false,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [
                {"type": "text", "text": "Hello "},
                {"type": "text", "text": "there"},
            ],
            "usage": {"input_tokens": 12, "output_tokens": 4},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = backend_for(&server).complete(&request()).await.unwrap();

    assert_eq!(response.text, "Hello there");
    assert_eq!(response.usage.input_tokens, 12);
    assert_eq!(response.usage.output_tokens, 4);
}

#[tokio::test]
async fn http_429_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(
            ResponseTemplate::new(429).set_body_string(r#"{"error":{"retry_after":2.0}}"#),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server).complete(&request()).await.unwrap_err();

    match err {
        PalaverError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, Some(2000)),
        other => panic!("expected rate limit, got {other:?}"),
    }
}

#[tokio::test]
async fn http_400_maps_to_invalid_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(400).set_body_string("max_tokens out of range"))
        .mount(&server)
        .await;

    let err = backend_for(&server).complete(&request()).await.unwrap_err();

    match err {
        PalaverError::InvalidRequest(detail) => {
            assert!(detail.contains("max_tokens out of range"));
        }
        other => panic!("expected invalid request, got {other:?}"),
    }
}

#[tokio::test]
async fn http_5xx_maps_to_generic_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = backend_for(&server).complete(&request()).await.unwrap_err();

    match err {
        PalaverError::Api { status, message } => {
            assert_eq!(status, 529);
            assert!(message.contains("overloaded"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn stream_parses_sse_deltas_and_final_usage() {
    let sse_body = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":9}}}\n",
        "\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n",
        "\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"lo\"}}\n",
        "\n",
        "event: message_delta\n",
        "data: {\"type\":\"message_delta\",\"usage\":{\"output_tokens\":2}}\n",
        "\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n",
        "\n",
    );

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(serde_json::json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body.as_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let stream = backend_for(&server).stream(&request()).await.unwrap();
    let deltas: Vec<_> = stream
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(|d| d.unwrap())
        .collect();

    let text: String = deltas
        .iter()
        .filter(|d| d.event_type == StreamEventType::TextDelta)
        .map(|d| d.text.as_str())
        .collect();
    assert_eq!(text, "Hello");

    let done = deltas.last().unwrap();
    assert_eq!(done.event_type, StreamEventType::Done);
    let usage = done.usage.unwrap();
    assert_eq!(usage.input_tokens, 9);
    assert_eq!(usage.output_tokens, 2);
}

#[tokio::test]
async fn stream_surfaces_provider_error_events() {
    let sse_body = concat!(
        "event: error\n",
        "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n",
        "\n",
    );

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body.as_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let stream = backend_for(&server).stream(&request()).await.unwrap();
    let results: Vec<_> = stream.collect::<Vec<_>>().await;

    assert_eq!(results.len(), 1);
    match results.into_iter().next().unwrap() {
        Err(PalaverError::Stream(message)) => assert_eq!(message, "Overloaded"),
        other => panic!("expected stream error, got {other:?}"),
    }
}
