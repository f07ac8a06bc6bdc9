// Clients for the hosted text-generation APIs the relay forwards to.

pub mod gemini;
pub mod openai;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::constants;
use self::gemini::GeminiClient;
use self::openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("no API key configured for {0}")]
    MissingApiKey(Provider),
    #[error("request to upstream API failed: {0}")]
    Http(reqwest::Error),
    #[error("upstream API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("upstream API returned no text")]
    EmptyResponse,
}

// Request URLs are dropped from transport errors so credentials carried in
// them never reach logs or stderr.
impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Http(e.without_url())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    Gemini,
    #[value(name = "openai")]
    OpenAi,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub supported_methods: Vec<String>,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one prompt and returns the primary text output.
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError>;

    async fn list_models(&self) -> Result<Vec<ModelInfo>, UpstreamError>;

    fn provider(&self) -> Provider;

    fn model(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl UpstreamConfig {
    pub fn resolved_model(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.provider {
            Provider::Gemini => constants::GEMINI_DEFAULT_MODEL.clone(),
            Provider::OpenAi => constants::OPENAI_DEFAULT_MODEL.clone(),
        })
    }

    pub fn resolved_base_url(&self) -> String {
        let base = self.base_url.clone().unwrap_or_else(|| match self.provider {
            Provider::Gemini => constants::GEMINI_BASE_URL.clone(),
            Provider::OpenAi => constants::OPENAI_BASE_URL.clone(),
        });
        base.trim_end_matches('/').to_string()
    }
}

pub fn new_client(config: &UpstreamConfig) -> Result<Arc<dyn CompletionClient>, UpstreamError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or(UpstreamError::MissingApiKey(config.provider))?;
    let model = config.resolved_model();
    let base_url = config.resolved_base_url();

    let client: Arc<dyn CompletionClient> = match config.provider {
        Provider::Gemini => Arc::new(GeminiClient::new(api_key, model, base_url)),
        Provider::OpenAi => Arc::new(OpenAiClient::new(api_key, model, base_url)?),
    };
    Ok(client)
}

/// Turns a non-success reply into `UpstreamError::Status`, keeping the body for the logs.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(UpstreamError::Status { status, body })
}
