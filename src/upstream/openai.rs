use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{check_status, CompletionClient, ModelInfo, Provider, UpstreamError};
use crate::constants;

#[derive(Serialize, Deserialize, Debug)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize, Debug)]
struct ListModelsResponse {
    #[serde(default)]
    data: Vec<OpenAiModel>,
}

#[derive(Deserialize, Debug)]
struct OpenAiModel {
    id: String,
}

pub struct OpenAiClient {
    http: Client,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // A key that is not a valid header value is treated like a missing one.
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| UpstreamError::MissingApiKey(Provider::OpenAi))?;
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            model,
            base_url,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let payload = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: constants::OPENAI_TEMPERATURE,
        };

        let response = self.http.post(&url).json(&payload).send().await?;
        let response = check_status(response).await.map_err(|e| {
            error!(error = %e, "OpenAI chat completion request failed");
            e
        })?;

        let body = response.json::<ChatResponse>().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(UpstreamError::EmptyResponse)?;

        debug!(chars = text.len(), "Received OpenAI response");
        Ok(text)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, UpstreamError> {
        let url = format!("{}/v1/models", self.base_url);
        let response = self.http.get(&url).send().await?;
        let body = check_status(response).await?.json::<ListModelsResponse>().await?;

        Ok(body
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.id,
                supported_methods: vec!["chat.completions".to_string()],
            })
            .collect())
    }

    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }
}
