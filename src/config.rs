// Command-line and environment configuration, parsed once at startup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::constants;
use crate::prompt::PromptStrategy;
use crate::render::ChatView;
use crate::upstream::{Provider, UpstreamConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PromptMode {
    /// Send the user's message as-is.
    Passthrough,
    /// Wrap the message in the artwork suggestion template.
    Suggestion,
}

#[derive(Args, Debug, Clone)]
pub struct UpstreamArgs {
    #[arg(long, env = "CHAT_PROVIDER", value_enum, default_value_t = Provider::Gemini, help = "Upstream text-generation provider.")]
    pub provider: Provider,
    #[arg(long, env = "CHAT_MODEL", help = "Model identifier (provider default when omitted).")]
    pub model: Option<String>,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
    #[arg(long, env = "UPSTREAM_BASE_URL", help = "Override the provider's API base URL.")]
    pub upstream_base_url: Option<String>,
}

impl UpstreamArgs {
    pub fn to_config(&self) -> UpstreamConfig {
        let api_key = match self.provider {
            Provider::Gemini => self.gemini_api_key.clone(),
            Provider::OpenAi => self.openai_api_key.clone(),
        };
        UpstreamConfig {
            provider: self.provider,
            api_key,
            model: self.model.clone(),
            base_url: self.upstream_base_url.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    #[arg(long, env = "CHAT_TITLE", default_value = constants::DEFAULT_TITLE)]
    pub title: String,
    #[arg(long, env = "CHAT_PLACEHOLDER", default_value = constants::DEFAULT_PLACEHOLDER)]
    pub placeholder: String,
}

impl ViewArgs {
    pub fn to_view(&self) -> ChatView {
        ChatView {
            title: self.title.clone(),
            placeholder: self.placeholder.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    #[arg(long, env = "PORT", default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
    pub port: u16,
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = constants::DEFAULT_ALLOWED_ORIGIN, help = "Single origin allowed by CORS.")]
    pub allowed_origin: String,
    #[command(flatten)]
    pub upstream: UpstreamArgs,
    #[arg(long, env = "PROMPT_STRATEGY", value_enum, default_value_t = PromptMode::Passthrough)]
    pub prompt_strategy: PromptMode,
    #[arg(long, env = "PROMPT_TEMPLATE_FILE", help = "Template file for the suggestion strategy; must contain {message}.")]
    pub prompt_template: Option<PathBuf>,
    #[command(flatten)]
    pub view: ViewArgs,
    #[arg(long, default_value = "templates")]
    pub templates_dir: PathBuf,
    #[arg(long, default_value = "static")]
    pub static_dir: PathBuf,
}

impl ServerArgs {
    pub fn prompt_strategy(&self) -> Result<PromptStrategy> {
        match (self.prompt_strategy, &self.prompt_template) {
            (PromptMode::Passthrough, _) => Ok(PromptStrategy::Passthrough),
            (PromptMode::Suggestion, None) => Ok(PromptStrategy::art_suggestion()),
            (PromptMode::Suggestion, Some(path)) => {
                PromptStrategy::from_template_file(path).context("Invalid prompt template")
            }
        }
    }
}
