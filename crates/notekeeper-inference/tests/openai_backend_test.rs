//! HTTP-level tests for the OpenAI-compatible backend against a mock server.

use std::sync::Arc;

use notekeeper_core::{
    ChatBackend, ChatOptions, ChatRequest, EmbeddingBackend, Error, InferenceBackend,
    MediaAttachment, TextEmbedder,
};
use notekeeper_inference::{Embedder, OpenAIBackend, OpenAIConfig};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer, dimension: usize) -> OpenAIBackend {
    OpenAIBackend::new(OpenAIConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        embed_model: "test-embed".to_string(),
        chat_model: "test-chat".to_string(),
        embed_dimension: dimension,
        timeout_seconds: 5,
        temperature: None,
    })
    .expect("Failed to create backend")
}

fn chat_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_embeddings_sorted_by_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-embed",
            "input": ["first", "second"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"embedding": [0.0, 1.0], "index": 1},
                {"embedding": [1.0, 0.0], "index": 0}
            ],
            "model": "test-embed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vectors = backend(&server, 2)
        .embed_texts(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors[0].as_slice(), &[1.0, 0.0]);
    assert_eq!(vectors[1].as_slice(), &[0.0, 1.0]);
}

#[tokio::test]
async fn test_empty_embedding_result_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&server)
        .await;

    let err = backend(&server, 2)
        .embed_texts(&["x".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
}

#[tokio::test]
async fn test_embedder_degrades_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": {"message": "overloaded", "type": "server_error"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = Embedder::with_dimension(Arc::new(backend(&server, 2)), 2);
    assert!(embedder.embed(Some("buy milk")).await.is_none());
}

#[tokio::test]
async fn test_embedder_rejects_wrong_dimension() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}]
        })))
        .mount(&server)
        .await;

    let embedder = Embedder::with_dimension(Arc::new(backend(&server, 2)), 2);
    assert!(embedder.embed(Some("buy milk")).await.is_none());
}

#[tokio::test]
async fn test_chat_sends_options_and_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-chat",
            "temperature": 0.3,
            "max_tokens": 2000,
            "messages": [
                {"role": "system", "content": "classify"},
                {"role": "user", "content": "a note"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("{\"topicId\":\"x\"}")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend(&server, 2)
        .chat(
            &ChatRequest::new("classify", "a note").with_options(ChatOptions {
                model: None,
                temperature: Some(0.3),
                max_tokens: Some(2000),
            }),
        )
        .await
        .unwrap();
    assert_eq!(reply, "{\"topicId\":\"x\"}");
}

#[tokio::test]
async fn test_chat_inlines_image_as_data_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "messages": [
                {"role": "system"},
                {"role": "user", "content": [
                    {"type": "text", "text": "what is this"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AQID"}}
                ]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("a picture")))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest::new("vision", "what is this").with_media(MediaAttachment {
        mime_type: "image/png".to_string(),
        data: vec![1, 2, 3],
        file_name: Some("a.png".to_string()),
    });
    let reply = backend(&server, 2).chat(&request).await.unwrap();
    assert_eq!(reply, "a picture");
}

#[tokio::test]
async fn test_chat_auth_failure_maps_to_config_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"message": "Invalid API key", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = backend(&server, 2)
        .chat(&ChatRequest::new("s", "u"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("Invalid API key"));
}

#[tokio::test]
async fn test_chat_without_choices_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
        )
        .mount(&server)
        .await;

    let err = backend(&server, 2)
        .chat(&ChatRequest::new("s", "u"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Inference(_)));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&server)
        .await;
    assert!(backend(&server, 2).health_check().await.unwrap());

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&down)
        .await;
    assert!(!backend(&down, 2).health_check().await.unwrap());
}
