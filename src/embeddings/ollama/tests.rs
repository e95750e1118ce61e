use super::*;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OllamaClient {
    let uri = Url::parse(&server.uri()).expect("mock server uri should parse");
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: uri.host_str().expect("mock server should have host").to_string(),
        port: uri.port().expect("mock server should have port"),
        embedding_model: "test-embed".to_string(),
        generation_model: "test-generate".to_string(),
        batch_size: 16,
    };

    OllamaClient::new(&config)
        .expect("should create client")
        .with_timeout(Duration::from_secs(5))
        .with_retry_attempts(1)
}

#[test]
fn client_configuration() {
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        embedding_model: "embed-model".to_string(),
        generation_model: "generate-model".to_string(),
        batch_size: 128,
    };
    let client = OllamaClient::new(&config).expect("should create client");

    assert_eq!(client.embedding_model, "embed-model");
    assert_eq!(client.generation_model, "generate-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = OllamaConfig::default();
    let client = OllamaClient::new(&config)
        .expect("should create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_preserves_order_and_count() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"model": "test-embed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let texts = vec!["first".to_string(), "second".to_string()];

    let embeddings = tokio::task::spawn_blocking(move || client.embed(&texts))
        .await
        .expect("task should not panic")
        .expect("embedding should succeed");

    assert_eq!(embeddings.len(), 2);
    assert_eq!(embeddings[0], vec![1.0, 0.0, 0.0]);
    assert_eq!(embeddings[1], vec![0.0, 1.0, 0.0]);
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_rejects_count_mismatch() {
    let server = MockServer::start().await;

    // Two inputs, one vector back: the client must error, never return a
    // partial result.
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let texts = vec!["first".to_string(), "second".to_string()];

    let result = tokio::task::spawn_blocking(move || client.embed(&texts))
        .await
        .expect("task should not panic");

    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_rejects_empty_vectors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let texts = vec!["first".to_string()];

    let result = tokio::task::spawn_blocking(move || client.embed(&texts))
        .await
        .expect("task should not panic");

    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_fails_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let texts = vec!["first".to_string()];

    let result = tokio::task::spawn_blocking(move || client.embed(&texts))
        .await
        .expect("task should not panic");

    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_returns_trimmed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "test-generate",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "  The policy is active.\n"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let answer = tokio::task::spawn_blocking(move || client.generate("What is the status?"))
        .await
        .expect("task should not panic")
        .expect("generation should succeed");

    assert_eq!(answer, "The policy is active.");
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_batch_skips_network() {
    // No mocks mounted: any request would fail the test.
    let server = MockServer::start().await;
    let client = client_for(&server);

    let embeddings = tokio::task::spawn_blocking(move || client.embed(&[]))
        .await
        .expect("task should not panic")
        .expect("empty batch should succeed");

    assert!(embeddings.is_empty());
}
