use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::constants;
use crate::conversation::{read_image_data_url, Conversation, ImageError, RelayOutcome};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not reach relay server: {0}")]
    Unreachable(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    message: &'a str,
}

#[derive(Deserialize, Debug, Default)]
struct ReplyBody {
    #[serde(default)]
    response: Option<serde_json::Value>,
}

/// The client's view of the relay endpoint.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Sends one message. `Ok(None)` means the server answered without usable text.
    async fn send(&self, message: &str) -> Result<Option<String>, TransportError>;
}

pub struct HttpRelayTransport {
    http: Client,
    url: String,
}

impl HttpRelayTransport {
    pub fn new(server_url: &str) -> Self {
        Self {
            http: Client::new(),
            url: format!("{}{}", server_url.trim_end_matches('/'), constants::RELAY_ROUTE),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn send(&self, message: &str) -> Result<Option<String>, TransportError> {
        let response = self
            .http
            .post(&self.url)
            .json(&OutgoingMessage { message })
            .send()
            .await?;
        let status = response.status();
        // Any JSON body is accepted regardless of status; the reply text decides.
        let body = response.json::<ReplyBody>().await?;
        debug!(%status, "Relay server answered");

        Ok(match body.response {
            Some(serde_json::Value::String(text)) if !text.is_empty() => Some(text),
            _ => None,
        })
    }
}

/// Clears the pending flag of a submitted message. If the relay call never
/// settles (the transport panicked or the submitting future was dropped), the
/// message is answered with the transport failure reply on drop.
struct PendingGuard {
    conversation: Option<Arc<Mutex<Conversation>>>,
}

impl PendingGuard {
    fn new(conversation: Arc<Mutex<Conversation>>) -> Self {
        Self {
            conversation: Some(conversation),
        }
    }

    async fn settle(mut self, outcome: RelayOutcome) {
        if let Some(conversation) = &self.conversation {
            conversation.lock().await.on_relay_result(outcome);
        }
        self.conversation = None;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let Some(conversation) = self.conversation.take() else {
            return;
        };
        warn!("Relay call abandoned before it settled");
        if let Ok(mut locked) = conversation.try_lock() {
            locked.on_relay_result(RelayOutcome::TransportFailed);
            return;
        }
        // Someone holds the lock; record the failure once it is released.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                conversation
                    .lock()
                    .await
                    .on_relay_result(RelayOutcome::TransportFailed);
            });
        }
    }
}

/// Drives a `Conversation` against a relay transport.
pub struct ChatSession {
    conversation: Arc<Mutex<Conversation>>,
    transport: Arc<dyn RelayTransport>,
    image_reply_delay: Duration,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn RelayTransport>) -> Self {
        Self::with_conversation(transport, Conversation::new())
    }

    pub fn with_conversation(transport: Arc<dyn RelayTransport>, conversation: Conversation) -> Self {
        Self {
            conversation: Arc::new(Mutex::new(conversation)),
            transport,
            image_reply_delay: constants::IMAGE_REPLY_DELAY,
        }
    }

    pub fn with_image_reply_delay(mut self, delay: Duration) -> Self {
        self.image_reply_delay = delay;
        self
    }

    /// A copy of the current conversation, for rendering.
    pub async fn snapshot(&self) -> Conversation {
        self.conversation.lock().await.clone()
    }

    /// Replaces the input draft.
    pub async fn set_input(&self, text: impl Into<String>) {
        self.conversation.lock().await.set_input(text);
    }

    /// Submits `text` and waits for the reply. Returns `false` if the
    /// submission was rejected (blank text or a reply still pending).
    pub async fn submit(&self, text: &str) -> bool {
        let outgoing = self.conversation.lock().await.submit(text);
        self.relay(outgoing).await
    }

    /// Submits the input draft. The draft is cleared once accepted and left
    /// untouched when rejected.
    pub async fn submit_input(&self) -> bool {
        let outgoing = self.conversation.lock().await.submit_input();
        self.relay(outgoing).await
    }

    // The lock is released before the network call so the view can render
    // the pending state meanwhile.
    async fn relay(&self, outgoing: Option<String>) -> bool {
        let Some(outgoing) = outgoing else {
            return false;
        };
        let guard = PendingGuard::new(self.conversation.clone());

        let outcome = match self.transport.send(&outgoing).await {
            Ok(Some(reply)) => RelayOutcome::Reply(reply),
            Ok(None) => RelayOutcome::NoReply,
            Err(e) => {
                warn!(error = %e, "Relay call failed");
                RelayOutcome::TransportFailed
            }
        };
        guard.settle(outcome).await;
        true
    }

    /// Appends the image at `path` and schedules the canned reply. The image
    /// is never sent to the relay.
    pub async fn upload_image(&self, path: &Path) -> Result<JoinHandle<()>, ImageError> {
        let data_url = read_image_data_url(path).await?;
        self.conversation.lock().await.push_image(data_url);

        let conversation = self.conversation.clone();
        let delay = self.image_reply_delay;
        Ok(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            conversation.lock().await.push_image_guidance();
        }))
    }
}
