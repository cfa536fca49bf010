//! Model provider trait and implementations.
//!
//! A provider is the completion collaborator of the agent loop: it takes the
//! ordered turns plus a token budget and returns either reply text or a
//! native tool call. Providers never retry.

pub mod http;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SkiffConfig;
use crate::error::SkiffError;
use crate::models::LanguageModel;
use crate::types::{GenerationSettings, Turn, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub turns: Vec<Turn>,
    pub settings: GenerationSettings,
    /// Tool definitions for native tool calling. `None` sends no tools.
    pub tools: Option<Vec<ToolDefinition>>,
}

impl CompletionRequest {
    pub fn new(turns: Vec<Turn>, settings: GenerationSettings) -> Self {
        Self {
            turns,
            settings,
            tools: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A tool call as returned by a native tool-calling API.
///
/// `arguments` is the undecoded JSON text; decoding is the interpreter's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: String,
}

/// Response from a provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    /// First tool call of the response, if the model made one.
    pub tool_call: Option<NativeToolCall>,
    pub usage: Usage,
}

impl Completion {
    /// A plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A reply consisting of a single native tool call.
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            tool_call: Some(NativeToolCall {
                id: None,
                name: name.into(),
                arguments: arguments.into(),
            }),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Text recorded in the conversation for this reply.
    ///
    /// Native tool calls are rendered as a JSON object after any reply text.
    pub fn transcript(&self) -> String {
        let Some(call) = &self.tool_call else {
            return self.text.clone();
        };
        let rendered = serde_json::json!({
            "tool_name": call.name,
            "arguments": call.arguments,
        })
        .to_string();
        if self.text.trim().is_empty() {
            rendered
        } else {
            format!("{}\n{rendered}", self.text)
        }
    }
}

/// Core trait implemented by all model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "ollama", "openai").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Request a single completion.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, SkiffError>;
}

/// Create a provider for the given model, using the provided config.
pub fn create_provider(
    model: &LanguageModel,
    config: &SkiffConfig,
) -> Result<Box<dyn ModelProvider>, SkiffError> {
    match model {
        LanguageModel::Ollama(m) => {
            let base_url = config
                .get_base_url("ollama")
                .unwrap_or_else(|| openai::OLLAMA_DEFAULT_BASE_URL.to_string());
            Ok(Box::new(openai::OpenAiProvider::ollama(m.clone(), base_url)?))
        }
        LanguageModel::OpenAi(m) => {
            let api_key = config
                .get_api_key("openai")
                .ok_or_else(|| SkiffError::Authentication("Missing OPENAI_API_KEY".into()))?;
            Ok(Box::new(openai::OpenAiProvider::new(
                m.clone(),
                api_key,
                config.get_base_url("openai"),
            )?))
        }
        LanguageModel::OpenAiCompatible(m) => {
            let base_url = config
                .get_base_url("openai-compatible")
                .ok_or_else(|| SkiffError::Configuration("Missing OPENAI_COMPAT_BASE_URL".into()))?;
            let api_key = config
                .get_api_key("openai-compatible")
                .unwrap_or_default();
            Ok(Box::new(openai::OpenAiProvider::compatible(
                m.clone(),
                api_key,
                base_url,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_of_text_reply_is_the_text() {
        assert_eq!(Completion::text("hello").transcript(), "hello");
    }

    #[test]
    fn transcript_renders_native_call() {
        let completion = Completion::tool_call("read_file", r#"{"file_name":"a.py"}"#);
        let rendered: serde_json::Value =
            serde_json::from_str(&completion.transcript()).unwrap();
        assert_eq!(rendered["tool_name"], "read_file");
        assert_eq!(rendered["arguments"], r#"{"file_name":"a.py"}"#);
    }

    #[test]
    fn create_provider_defaults_ollama_url() {
        let config = SkiffConfig::default();
        let provider = create_provider(&LanguageModel::default(), &config).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_id(), "qwen2.5:14b");
    }

    #[test]
    fn create_provider_requires_openai_key() {
        let config = SkiffConfig::default();
        let err = match create_provider(&LanguageModel::OpenAi("gpt-4o".into()), &config) {
            Ok(_) => panic!("expected missing key error"),
            Err(err) => err,
        };
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn create_provider_requires_compatible_base_url() {
        let config = SkiffConfig::default();
        let model = LanguageModel::OpenAiCompatible("local".into());
        assert!(matches!(
            create_provider(&model, &config),
            Err(SkiffError::Configuration(_))
        ));
    }
}
