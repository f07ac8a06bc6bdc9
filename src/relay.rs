use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::constants;
use crate::prompt::PromptStrategy;
use crate::upstream::{CompletionClient, UpstreamError};

/// Body accepted by the relay route. A missing or non-string `message`
/// deserializes to `None` so it can be reported as a validation failure.
#[derive(Debug, Default, Deserialize)]
pub struct RelayRequest {
    #[serde(default, deserialize_with = "string_or_none")]
    pub message: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("message is required")]
    Validation,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::Validation => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: constants::VALIDATION_ERROR_MESSAGE.to_string(),
                }),
            )
                .into_response(),
            // Upstream detail stays in the server log.
            RelayError::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RelayResponse {
                    response: constants::UPSTREAM_FAILURE_REPLY.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// Forwards one user message to the upstream API.
#[derive(Clone)]
pub struct RelayService {
    client: Arc<dyn CompletionClient>,
    strategy: PromptStrategy,
}

impl RelayService {
    pub fn new(client: Arc<dyn CompletionClient>, strategy: PromptStrategy) -> Self {
        Self { client, strategy }
    }

    pub fn client(&self) -> &Arc<dyn CompletionClient> {
        &self.client
    }

    pub fn strategy(&self) -> &PromptStrategy {
        &self.strategy
    }

    #[instrument(skip_all, fields(provider = %self.client.provider(), strategy = self.strategy.name()))]
    pub async fn relay(&self, request: RelayRequest) -> Result<RelayResponse, RelayError> {
        let message = request
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or(RelayError::Validation)?;

        let prompt = self.strategy.render(&message);
        debug!(?prompt, "Constructed upstream prompt");

        match self.client.complete(&prompt).await {
            Ok(response) => {
                info!(chars = response.len(), "Relayed upstream reply");
                Ok(RelayResponse { response })
            }
            Err(e) => {
                error!(error = %e, "Upstream completion failed");
                Err(RelayError::Upstream(e))
            }
        }
    }
}
