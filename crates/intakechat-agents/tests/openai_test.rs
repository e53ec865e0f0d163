use std::sync::Arc;
use std::time::Duration;

use intakechat_agents::{
    ChatMessage, CompletionRelay, LlmProvider, LlmRequest, OpenAiProvider, RelayError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1677652288,
        "model": "gpt-3.5-turbo-0613",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content,
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 9,
            "completion_tokens": 12,
            "total_tokens": 21
        }
    })
}

#[tokio::test]
async fn test_openai_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello there!")))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new("test-key".to_string(), Some(mock_server.uri()));
    let request = LlmRequest {
        model: "gpt-3.5-turbo".to_string(),
        messages: vec![
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("Hello"),
        ],
        max_tokens: None,
        temperature: None,
    };

    let response = provider.complete(&request).await.unwrap();

    assert_eq!(response.text.as_deref(), Some("Hello there!"));
    assert_eq!(response.model, "gpt-3.5-turbo-0613");
    assert_eq!(response.usage.unwrap().output_tokens, 12);
    assert_eq!(response.stop_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn test_openai_error_status_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new("bad-key".to_string(), Some(mock_server.uri()));
    let request = LlmRequest {
        model: "gpt-3.5-turbo".to_string(),
        messages: vec![ChatMessage::user("Hi")],
        max_tokens: None,
        temperature: None,
    };

    let err = provider.complete(&request).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("status=401"), "{message}");
    assert!(message.contains("invalid api key"), "{message}");
}

#[tokio::test]
async fn test_openai_health_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new("test-key".to_string(), Some(mock_server.uri()));
    assert!(provider.health_check().await.unwrap());
}

#[tokio::test]
async fn test_relay_sends_model_settings() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 256,
            "temperature": 0.2,
            "stream": false,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Fees are 100.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = Arc::new(OpenAiProvider::new(
        "test-key".to_string(),
        Some(mock_server.uri()),
    ));
    let relay = CompletionRelay::new(provider, "gpt-4o-mini")
        .with_max_tokens(256)
        .with_temperature(0.2);

    let answer = relay
        .complete(vec![ChatMessage::user("What are the fees?")])
        .await
        .unwrap();
    assert_eq!(answer, "Fees are 100.");
}

#[tokio::test]
async fn test_relay_timeout_is_typed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let provider = Arc::new(OpenAiProvider::new(
        "test-key".to_string(),
        Some(mock_server.uri()),
    ));
    let relay =
        CompletionRelay::new(provider, "gpt-3.5-turbo").with_timeout(Duration::from_secs(1));

    let err = relay
        .complete(vec![ChatMessage::user("Hi")])
        .await
        .unwrap_err();
    assert_eq!(err, RelayError::Timeout(1));
}

#[tokio::test]
async fn test_relay_maps_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&mock_server)
        .await;

    let provider = Arc::new(OpenAiProvider::new(
        "test-key".to_string(),
        Some(mock_server.uri()),
    ));
    let relay = CompletionRelay::new(provider, "gpt-3.5-turbo");

    match relay.complete(vec![ChatMessage::user("Hi")]).await {
        Err(RelayError::Provider(msg)) => assert!(msg.contains("status=500"), "{msg}"),
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_relay_health_check_is_bounded_by_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(120)))
        .mount(&mock_server)
        .await;

    let provider = Arc::new(OpenAiProvider::new(
        "test-key".to_string(),
        Some(mock_server.uri()),
    ));
    let relay =
        CompletionRelay::new(provider, "gpt-3.5-turbo").with_timeout(Duration::from_secs(1));

    let start = std::time::Instant::now();
    let healthy = relay.health_check().await;
    assert!(!healthy);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_provider_uses_supplied_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(120)))
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    let provider =
        OpenAiProvider::new("test-key".to_string(), Some(mock_server.uri())).with_client(client);

    let start = std::time::Instant::now();
    assert!(!provider.health_check().await.unwrap());
    assert!(start.elapsed() < Duration::from_secs(10));
}
