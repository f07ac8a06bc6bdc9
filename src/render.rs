use crate::constants;
use crate::conversation::{Conversation, Message, MessageContent};

/// Presentation-only settings of the chat surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub title: String,
    pub placeholder: String,
}

impl Default for ChatView {
    fn default() -> Self {
        Self {
            title: constants::DEFAULT_TITLE.to_string(),
            placeholder: constants::DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

pub fn speaker(message: &Message) -> &'static str {
    if message.is_from_bot {
        "Bot"
    } else {
        "You"
    }
}

pub fn render_message(message: &Message) -> String {
    let header = format!("[{}] {}:", message.timestamp.format("%H:%M"), speaker(message));
    match &message.content {
        MessageContent::Text(text) => format!("{} {}", header, text),
        MessageContent::Lines(lines) => {
            let mut out = header;
            for line in lines {
                out.push_str("\n  • ");
                out.push_str(line);
            }
            out
        }
        MessageContent::Image(data_url) => format!("{} [image, {} bytes]", header, data_url.len()),
    }
}

pub fn typing_indicator() -> String {
    "Bot is typing...".to_string()
}

pub fn render_transcript(conversation: &Conversation, view: &ChatView) -> String {
    let mut lines = vec![format!("== {} ==", view.title)];
    lines.extend(conversation.messages().iter().map(render_message));
    if conversation.is_pending() {
        lines.push(typing_indicator());
    }
    lines.join("\n")
}
