// Client-side conversation state: the message list, the input draft and the
// pending flag. Every transition here is synchronous; the network call and the
// delayed image reply are driven by `session::ChatSession`.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::constants;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    Lines(Vec<String>),
    /// `data:<mime>;base64,<payload>` URL of an uploaded image.
    Image(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: MessageContent,
    pub is_from_bot: bool,
    /// Set from `content` at construction.
    pub is_image: bool,
    pub timestamp: DateTime<Local>,
}

impl Message {
    fn new(content: MessageContent, is_from_bot: bool) -> Self {
        let is_image = matches!(content, MessageContent::Image(_));
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            is_from_bot,
            is_image,
            timestamp: Local::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageContent::Text(text.into()), false)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(MessageContent::Text(text.into()), true)
    }

    pub fn bot_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            MessageContent::Lines(lines.into_iter().map(Into::into).collect()),
            true,
        )
    }

    pub fn image(data_url: String) -> Self {
        Self::new(MessageContent::Image(data_url), false)
    }

    pub fn is_image(&self) -> bool {
        self.is_image
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// What the relay call produced, as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The server answered with a non-empty `response` string.
    Reply(String),
    /// The server answered, but without usable text.
    NoReply,
    /// The server could not be reached or its answer was unreadable.
    TransportFailed,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not an image file")]
    NotAnImage(String),
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    input: String,
    pending: bool,
}

impl Conversation {
    /// A conversation seeded with the assistant's greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::bot(constants::GREETING)],
            input: String::new(),
            pending: false,
        }
    }

    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            pending: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Accepts `text` as the next user message. Returns the trimmed text that
    /// must be relayed, or `None` when the text is blank or a reply is still
    /// pending (nothing changes in that case).
    pub fn submit(&mut self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.pending {
            return None;
        }
        self.messages.push(Message::user(trimmed));
        self.input.clear();
        self.pending = true;
        Some(trimmed.to_string())
    }

    /// Submits whatever is in the input draft.
    pub fn submit_input(&mut self) -> Option<String> {
        let draft = self.input.clone();
        self.submit(&draft)
    }

    /// Records the result of the relay call. Appends exactly one bot message
    /// and clears the pending flag whatever the outcome.
    pub fn on_relay_result(&mut self, outcome: RelayOutcome) {
        let text = match outcome {
            RelayOutcome::Reply(text) => text,
            RelayOutcome::NoReply => constants::EMPTY_REPLY_FALLBACK.to_string(),
            RelayOutcome::TransportFailed => constants::TRANSPORT_FAILURE_REPLY.to_string(),
        };
        self.messages.push(Message::bot(text));
        self.pending = false;
    }

    pub fn push_image(&mut self, data_url: String) {
        self.messages.push(Message::image(data_url));
    }

    /// The canned answer to an uploaded image.
    pub fn push_image_guidance(&mut self) {
        self.messages.push(Message::bot_lines(constants::IMAGE_GUIDANCE));
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(mime)
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Reads an image file into an embeddable data URL.
pub async fn read_image_data_url(path: &Path) -> Result<String, ImageError> {
    let display = path.display().to_string();
    let mime = image_mime_type(path).ok_or_else(|| ImageError::NotAnImage(display.clone()))?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ImageError::Read {
            path: display,
            source,
        })?;
    Ok(to_data_url(mime, &bytes))
}
