//! Plain chat with conversation memory.
//!
//! No tools and no action parsing: every reply is text. A failed completion
//! is answered with `Error: <message>` and that text is remembered like any
//! other reply.

use std::sync::Arc;

use tracing::warn;

use crate::conversation::Conversation;
use crate::error::SkiffError;
use crate::provider::{CompletionRequest, ModelProvider};
use crate::types::{GenerationSettings, Turn};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Multi-turn chat session.
pub struct ChatSession {
    provider: Arc<dyn ModelProvider>,
    conversation: Conversation,
    settings: GenerationSettings,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        system_prompt: impl Into<String>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            provider,
            conversation: Conversation::with_system(system_prompt),
            settings,
        }
    }

    /// Send a user message and return the reply.
    pub async fn send(&mut self, text: impl Into<String>) -> String {
        self.conversation.append(Turn::user(text));
        let reply = reply_or_error(
            self.provider.as_ref(),
            self.conversation.as_prompt_sequence().to_vec(),
            &self.settings,
        )
        .await;
        self.conversation.append(Turn::assistant(reply.clone()));
        reply
    }

    /// Turns exchanged so far, system prompt first.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// One completion for `prompt` under `system`, remembering nothing.
    pub async fn ask(
        provider: &dyn ModelProvider,
        system: Option<&str>,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> String {
        let mut turns = Vec::with_capacity(2);
        if let Some(system) = system {
            turns.push(Turn::system(system));
        }
        turns.push(Turn::user(prompt));
        reply_or_error(provider, turns, settings).await
    }
}

async fn reply_or_error(
    provider: &dyn ModelProvider,
    turns: Vec<Turn>,
    settings: &GenerationSettings,
) -> String {
    let request = CompletionRequest::new(turns, settings.clone());
    match provider.complete(&request).await {
        Ok(completion) => completion.transcript(),
        Err(e) => error_reply(&e),
    }
}

fn error_reply(error: &SkiffError) -> String {
    warn!(category = %error.category(), error = %error, "chat completion failed");
    format!("Error: {error}")
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("provider", &self.provider.provider_name())
            .field("turns", &self.conversation.len())
            .finish()
    }
}
