//! Model selection.
//!
//! Models are named `provider:model`. Only the first colon separates the two,
//! so Ollama tags such as `ollama:qwen2.5:14b` keep their own colon.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SkiffError;

/// Default model: a locally served Qwen through Ollama.
pub const DEFAULT_MODEL: &str = "ollama:qwen2.5:14b";

/// Language model reference, dispatching to a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "provider", content = "model")]
pub enum LanguageModel {
    /// Ollama's OpenAI-compatible endpoint.
    Ollama(String),
    /// OpenAI Chat Completions.
    OpenAi(String),
    /// Any other server speaking the Chat Completions protocol.
    OpenAiCompatible(String),
}

impl LanguageModel {
    /// Get the model's API identifier string.
    pub fn model_id(&self) -> &str {
        match self {
            Self::Ollama(m) => m,
            Self::OpenAi(m) => m,
            Self::OpenAiCompatible(m) => m,
        }
    }

    /// Get the provider name.
    pub fn provider_name(&self) -> &str {
        match self {
            Self::Ollama(_) => "ollama",
            Self::OpenAi(_) => "openai",
            Self::OpenAiCompatible(_) => "openai-compatible",
        }
    }

    /// Parse a `provider:model` selector.
    pub fn parse(selector: &str) -> Result<Self, SkiffError> {
        let (provider, model_id) = selector.split_once(':').ok_or_else(|| {
            SkiffError::InvalidArgument(format!(
                "Invalid model format: '{selector}'. Use provider:model (e.g. {DEFAULT_MODEL})"
            ))
        })?;
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(SkiffError::InvalidArgument(format!(
                "Missing model id in '{selector}'"
            )));
        }

        match provider.trim() {
            "ollama" => Ok(Self::Ollama(model_id.to_string())),
            "openai" => Ok(Self::OpenAi(model_id.to_string())),
            "openai-compatible" | "openai_compatible" => {
                Ok(Self::OpenAiCompatible(model_id.to_string()))
            }
            other => Err(SkiffError::ModelNotFound(format!(
                "No provider '{other}' for model '{model_id}' (expected one of: {})",
                PROVIDERS.join(", ")
            ))),
        }
    }
}

impl Default for LanguageModel {
    fn default() -> Self {
        Self::Ollama("qwen2.5:14b".to_string())
    }
}

impl FromStr for LanguageModel {
    type Err = SkiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider_name(), self.model_id())
    }
}

const PROVIDERS: [&str; 3] = ["ollama", "openai", "openai-compatible"];
