use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chat_relay::upstream::new_client;
use chat_relay::{Provider, UpstreamConfig, UpstreamError};

fn config(provider: Provider, server: &MockServer, model: Option<&str>) -> UpstreamConfig {
    UpstreamConfig {
        provider,
        api_key: Some("test-key".to_string()),
        model: model.map(str::to_string),
        base_url: Some(server.uri()),
    }
}

#[tokio::test]
async fn test_gemini_generate_content_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_json(json!({
            "contents": [{ "parts": [{ "text": "hello" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hi " }, { "text": "there!" }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = new_client(&config(Provider::Gemini, &server, Some("models/gemini-1.5-flash"))).unwrap();
    let reply = client.complete("hello").await.unwrap();

    assert_eq!(reply, "Hi there!");
}

#[tokio::test]
async fn test_gemini_without_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let client = new_client(&config(Provider::Gemini, &server, None)).unwrap();
    let err = client.complete("hello").await.unwrap_err();

    assert!(matches!(err, UpstreamError::EmptyResponse));
}

#[tokio::test]
async fn test_gemini_error_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let client = new_client(&config(Provider::Gemini, &server, None)).unwrap();
    match client.complete("hello").await {
        Err(UpstreamError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(body, "API key not valid");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gemini_list_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"] },
                { "name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"] }
            ]
        })))
        .mount(&server)
        .await;

    let client = new_client(&config(Provider::Gemini, &server, None)).unwrap();
    let models = client.list_models().await.unwrap();

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "models/gemini-1.5-flash");
    assert_eq!(models[0].supported_methods, vec!["generateContent", "countTokens"]);
}

#[tokio::test]
async fn test_openai_chat_completion_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "model": "gpt-3.5-turbo",
            "messages": [{ "role": "user", "content": "suggest a title" }],
            "temperature": 0.7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Title: Dusk" },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = new_client(&config(Provider::OpenAi, &server, Some("gpt-3.5-turbo"))).unwrap();
    let reply = client.complete("suggest a title").await.unwrap();

    assert_eq!(reply, "Title: Dusk");
}

#[tokio::test]
async fn test_openai_empty_choices_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = new_client(&config(Provider::OpenAi, &server, None)).unwrap();
    let err = client.complete("hi").await.unwrap_err();

    assert!(matches!(err, UpstreamError::EmptyResponse));
}

#[tokio::test]
async fn test_openai_malformed_body_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = new_client(&config(Provider::OpenAi, &server, None)).unwrap();
    let err = client.complete("hi").await.unwrap_err();

    assert!(matches!(err, UpstreamError::Http(_)));
}

#[tokio::test]
async fn test_openai_list_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{ "id": "gpt-4o", "object": "model" }, { "id": "gpt-3.5-turbo", "object": "model" }]
        })))
        .mount(&server)
        .await;

    let client = new_client(&config(Provider::OpenAi, &server, None)).unwrap();
    let names: Vec<String> = client
        .list_models()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();

    assert_eq!(names, vec!["gpt-4o", "gpt-3.5-turbo"]);
}

#[tokio::test]
async fn test_unreachable_upstream_is_http_error() {
    // Bind then drop a listener so nothing answers on the port.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let cfg = UpstreamConfig {
        provider: Provider::Gemini,
        api_key: Some("test-key".to_string()),
        model: None,
        base_url: Some(uri),
    };

    let client = new_client(&cfg).unwrap();
    let err = client.complete("hello").await.unwrap_err();

    assert!(matches!(err, UpstreamError::Http(_)));
}

#[tokio::test]
async fn test_transport_errors_never_carry_the_api_key() {
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    for provider in [Provider::Gemini, Provider::OpenAi] {
        let cfg = UpstreamConfig {
            provider,
            api_key: Some("SECRET-KEY-123".to_string()),
            model: None,
            base_url: Some(uri.clone()),
        };
        let client = new_client(&cfg).unwrap();

        let complete_err = client.complete("hello").await.unwrap_err();
        let list_err = client.list_models().await.unwrap_err();

        for err in [complete_err, list_err] {
            assert!(matches!(err, UpstreamError::Http(_)));
            assert!(!err.to_string().contains("SECRET-KEY-123"), "{}", err);
            assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
        }
    }
}
