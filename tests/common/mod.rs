//! Shared test helpers and scripted provider.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use skiff::error::SkiffError;
use skiff::provider::{Completion, CompletionRequest, ModelProvider};
use skiff::types::Usage;

/// Reply used once the script runs out: prose, never an action.
pub const FALLBACK_REPLY: &str = "I am still thinking about it.";

/// A provider that replays queued completions and records every request.
pub struct ScriptedProvider {
    model_id: String,
    replies: Mutex<VecDeque<Result<Completion, SkiffError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            model_id: "scripted".to_string(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Queue a plain text reply.
    pub fn queue_text(&self, text: &str) {
        self.queue(Ok(Completion::text(text).with_usage(usage())));
    }

    /// Queue a reply carrying a fenced `action` block.
    pub fn queue_action(&self, tool_name: &str, args: serde_json::Value) {
        self.queue_text(&fenced_action(tool_name, args));
    }

    /// Queue a native tool call with raw argument text.
    pub fn queue_tool_call(&self, name: &str, arguments: &str) {
        self.queue(Ok(Completion::tool_call(name, arguments).with_usage(usage())));
    }

    /// Queue a completion exactly as given.
    pub fn queue_completion(&self, completion: Completion) {
        self.queue(Ok(completion));
    }

    /// Queue a failed completion.
    pub fn queue_error(&self, error: SkiffError) {
        self.queue(Err(error));
    }

    fn queue(&self, reply: Result<Completion, SkiffError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, SkiffError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Completion::text(FALLBACK_REPLY)))
    }
}

/// Model-style reply: a line of reasoning, then the fenced action.
pub fn fenced_action(tool_name: &str, args: serde_json::Value) -> String {
    format!(
        "Let me work on this step by step.\n\n```action\n{}\n```",
        serde_json::json!({ "tool_name": tool_name, "args": args })
    )
}

fn usage() -> Usage {
    Usage {
        input_tokens: 10,
        output_tokens: 20,
        total_tokens: 30,
    }
}
