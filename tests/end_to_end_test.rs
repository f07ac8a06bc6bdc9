use std::sync::Arc;

use async_trait::async_trait;

use chat_relay::constants::{TRANSPORT_FAILURE_REPLY, UPSTREAM_FAILURE_REPLY};
use chat_relay::web_server::{build_router, WebConfig};
use chat_relay::{
    ChatSession, CompletionClient, Conversation, HttpRelayTransport, ModelInfo, PromptStrategy,
    Provider, RelayService, UpstreamError,
};

struct FixedUpstream(Option<&'static str>);

#[async_trait]
impl CompletionClient for FixedUpstream {
    async fn complete(&self, _prompt: &str) -> Result<String, UpstreamError> {
        self.0
            .map(str::to_string)
            .ok_or(UpstreamError::EmptyResponse)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, UpstreamError> {
        Ok(Vec::new())
    }

    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn model(&self) -> &str {
        "fixed"
    }
}

/// Serves the relay on an ephemeral port and returns its base URL.
async fn spawn_relay(upstream: FixedUpstream) -> String {
    let relay = RelayService::new(Arc::new(upstream), PromptStrategy::Passthrough);
    let app = build_router(relay, &WebConfig::default()).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn session_for(url: &str) -> ChatSession {
    ChatSession::with_conversation(Arc::new(HttpRelayTransport::new(url)), Conversation::new())
}

#[tokio::test]
async fn test_session_round_trip_through_relay() {
    let url = spawn_relay(FixedUpstream(Some("Hi there!"))).await;
    let session = session_for(&url);

    assert!(session.submit("hello").await);

    let conversation = session.snapshot().await;
    // greeting, user message, reply
    assert_eq!(conversation.len(), 3);
    assert_eq!(conversation.messages()[2].text(), Some("Hi there!"));
    assert!(!conversation.is_pending());
}

#[tokio::test]
async fn test_upstream_failure_reaches_the_user_as_generic_reply() {
    let url = spawn_relay(FixedUpstream(None)).await;
    let session = session_for(&url);

    session.submit("hello").await;

    let conversation = session.snapshot().await;
    assert_eq!(conversation.messages()[2].text(), Some(UPSTREAM_FAILURE_REPLY));
    assert!(!conversation.is_pending());
}

#[tokio::test]
async fn test_non_json_answer_counts_as_transport_failure() {
    // Posting under /static gets a plain-text answer instead of relay JSON.
    let url = spawn_relay(FixedUpstream(Some("unused"))).await;
    let session = session_for(&format!("{}/static/missing", url));

    session.submit("hello").await;

    let conversation = session.snapshot().await;
    assert_eq!(conversation.messages()[2].text(), Some(TRANSPORT_FAILURE_REPLY));
    assert!(!conversation.is_pending());
}
