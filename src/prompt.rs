use std::path::Path;

use anyhow::{bail, Context, Result};

/// Placeholder replaced by the user's message in a structured template.
pub const MESSAGE_PLACEHOLDER: &str = "{message}";

pub const ART_SUGGESTION_TEMPLATE: &str = r#"You are an art assistant. A seller said: "{message}".
Please suggest:
1. A title for the artwork
2. A short description
3. Suitable category (e.g., Digital Art, Painting, Sketch, etc.)
4. Beginner-friendly estimated price in INR"#;

/// How a user message is turned into the prompt sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptStrategy {
    /// Forward the message unchanged.
    Passthrough,
    /// Substitute the message into an instructional template.
    StructuredSuggestion(String),
}

impl PromptStrategy {
    pub fn structured(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(MESSAGE_PLACEHOLDER) {
            bail!(
                "Prompt template must contain the {} placeholder",
                MESSAGE_PLACEHOLDER
            );
        }
        Ok(Self::StructuredSuggestion(template))
    }

    pub fn art_suggestion() -> Self {
        Self::StructuredSuggestion(ART_SUGGESTION_TEMPLATE.to_string())
    }

    pub fn from_template_file(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt template {}", path.display()))?;
        Self::structured(template)
    }

    pub fn render(&self, message: &str) -> String {
        match self {
            Self::Passthrough => message.to_string(),
            Self::StructuredSuggestion(template) => template.replace(MESSAGE_PLACEHOLDER, message),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::StructuredSuggestion(_) => "suggestion",
        }
    }
}

impl Default for PromptStrategy {
    fn default() -> Self {
        Self::Passthrough
    }
}
