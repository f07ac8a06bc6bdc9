// Fixed strings and env-derived defaults shared by the server and the chat client.

use std::env;
use std::time::Duration;

lazy_static::lazy_static! {
    pub static ref GEMINI_BASE_URL: String = env::var("GEMINI_BASE_URL").unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
    pub static ref OPENAI_BASE_URL: String = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());
    pub static ref GEMINI_DEFAULT_MODEL: String = env::var("GEMINI_DEFAULT_MODEL").unwrap_or_else(|_| "models/gemini-1.5-flash".to_string());
    pub static ref OPENAI_DEFAULT_MODEL: String = env::var("OPENAI_DEFAULT_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
}

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8080";
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000";

/// Route the browser UI posts to.
pub const RELAY_ROUTE: &str = "/api/chatbot";

pub const OPENAI_TEMPERATURE: f32 = 0.7;

// Server-side payloads
pub const VALIDATION_ERROR_MESSAGE: &str = "Message is required";
pub const UPSTREAM_FAILURE_REPLY: &str = "⚠️ Error processing your message.";

// Client-side replies
pub const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";
pub const TRANSPORT_FAILURE_REPLY: &str = "⚠️ Error connecting to AI service.";
pub const EMPTY_REPLY_FALLBACK: &str = "Sorry, I couldn't generate a response.";

pub const IMAGE_REPLY_DELAY: Duration = Duration::from_secs(1);
pub const IMAGE_GUIDANCE: [&str; 3] = [
    "Please provide the image.",
    "I cannot receive images directly.",
    "You can upload it to an image hosting site (e.g., Imgur) and share the link.",
];

pub const DEFAULT_TITLE: &str = "AI Assistant";
pub const DEFAULT_PLACEHOLDER: &str = "Ask me anything...";
