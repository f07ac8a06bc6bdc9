pub mod chat;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod prompt;
pub mod relay;
pub mod render;
pub mod session;
pub mod upstream;
pub mod web_server;

pub use conversation::{Conversation, Message, MessageContent, RelayOutcome};
pub use prompt::PromptStrategy;
pub use relay::{RelayError, RelayRequest, RelayResponse, RelayService};
pub use session::{ChatSession, HttpRelayTransport, RelayTransport, TransportError};
pub use upstream::{CompletionClient, ModelInfo, Provider, UpstreamConfig, UpstreamError};
