//! OpenAI Chat Completions API provider.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::SkiffError;
use crate::types::{Role, Turn, Usage};

use super::http::{bearer_headers, build_client, status_to_error};
use super::{Completion, CompletionRequest, ModelProvider, NativeToolCall};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OpenAiProvider {
    provider_name: &'static str,
    model_id: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(
        model_id: String,
        api_key: String,
        base_url: Option<String>,
    ) -> Result<Self, SkiffError> {
        Ok(Self {
            provider_name: "openai",
            model_id,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: build_client()?,
        })
    }

    /// A local Ollama server. Its OpenAI-compatible API lives under `/v1` and needs no key.
    pub fn ollama(model_id: String, base_url: String) -> Result<Self, SkiffError> {
        let base_url = format!("{}/v1", base_url.trim_end_matches('/'));
        Ok(Self::new(model_id, String::new(), Some(base_url))?.named("ollama"))
    }

    /// Any server speaking the Chat Completions API at `base_url`.
    pub fn compatible(
        model_id: String,
        api_key: String,
        base_url: String,
    ) -> Result<Self, SkiffError> {
        Ok(Self::new(model_id, api_key, Some(base_url))?.named("openai-compatible"))
    }

    fn named(mut self, provider_name: &'static str) -> Self {
        self.provider_name = provider_name;
        self
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let messages = request.turns.iter().map(turn_to_openai).collect::<Vec<_>>();

        let mut body = serde_json::json!({
            "model": self.model_id,
            "messages": messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(max) = request.settings.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
            if let Some(temp) = request.settings.temperature {
                obj.insert("temperature".into(), temp.into());
            }
            if let Some(tools) = request.tools.as_ref().filter(|t| !t.is_empty()) {
                let tool_defs: Vec<serde_json::Value> = tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
                        })
                    })
                    .collect();
                obj.insert("tools".into(), tool_defs.into());
            }
        }

        body
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, SkiffError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            provider = self.provider_name,
            model = %self.model_id,
            turns = request.turns.len(),
            "chat completion request"
        );

        let resp = self
            .client
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: OpenAiChatResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SkiffError::api(200, "No choices in chat completion response"))?;

        let mut calls = choice.message.tool_calls.unwrap_or_default().into_iter();
        let tool_call = calls.next().map(|tc| NativeToolCall {
            id: tc.id,
            name: tc.function.name,
            arguments: arguments_text(tc.function.arguments),
        });
        let ignored = calls.count();
        if ignored > 0 {
            debug!(ignored, "only the first tool call of a response is used");
        }

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            tool_call,
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
        })
    }
}

/// Tool results go back as user turns: plain turns carry no tool-call id.
fn turn_to_openai(turn: &Turn) -> serde_json::Value {
    let role = match turn.role() {
        Role::System => "system",
        Role::User | Role::ToolResult => "user",
        Role::Assistant => "assistant",
    };
    serde_json::json!({ "role": role, "content": turn.content() })
}

/// Some servers send arguments as an object instead of JSON text.
fn arguments_text(arguments: serde_json::Value) -> String {
    match arguments {
        serde_json::Value::String(raw) => raw,
        other => other.to_string(),
    }
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: Option<String>,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
