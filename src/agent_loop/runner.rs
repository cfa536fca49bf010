//! The agent loop runner.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::action::{interpreter_for, Action, ResponseInterpreter};
use crate::config::{Protocol, SkiffConfig};
use crate::conversation::Conversation;
use crate::error::SkiffError;
use crate::prompt;
use crate::provider::{self, CompletionRequest, ModelProvider, ToolDefinition};
use crate::tools::builtin;
use crate::tools::{ToolRegistry, ToolResult};
use crate::types::{Turn, Usage};

use super::events::{LoopEventEmitter, LoopEventPayload, LoopEventSink};
use super::types::{LoopSettings, LoopState, RunId, RunReport};

/// Feedback when `terminate` arrives without a summary.
pub const TERMINATE_WITHOUT_MESSAGE: &str =
    "The terminate action requires a string 'message' argument with a summary for the user.";

/// One run of the agent loop.
///
/// Owns everything the run touches. [`AgentLoop::run`] consumes it, so the
/// conversation can only be reached again through the returned report.
pub struct AgentLoop {
    run_id: RunId,
    provider: Arc<dyn ModelProvider>,
    interpreter: Box<dyn ResponseInterpreter>,
    registry: ToolRegistry,
    settings: LoopSettings,
    rules: Option<String>,
    event_sink: Option<LoopEventSink>,
}

impl AgentLoop {
    /// A loop using the fenced-block protocol and default settings.
    pub fn new(provider: Arc<dyn ModelProvider>, registry: ToolRegistry) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            provider,
            interpreter: interpreter_for(Protocol::Fenced),
            registry,
            settings: LoopSettings::default(),
            rules: None,
            event_sink: None,
        }
    }

    /// Provider, built-in tools, protocol and limits taken from `config`.
    pub fn from_config(config: &SkiffConfig) -> Result<Self, SkiffError> {
        let provider: Arc<dyn ModelProvider> =
            Arc::from(provider::create_provider(&config.model, config)?);
        let registry = ToolRegistry::from_tools(builtin::all_tools(config.workdir.clone()))?;
        Ok(Self::new(provider, registry)
            .with_protocol(config.protocol)
            .with_settings(LoopSettings::from_config(config)))
    }

    pub fn with_protocol(self, protocol: Protocol) -> Self {
        self.with_interpreter(interpreter_for(protocol))
    }

    pub fn with_interpreter(mut self, interpreter: Box<dyn ResponseInterpreter>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_settings(mut self, settings: LoopSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the generated system rules.
    pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
        self.rules = Some(rules.into());
        self
    }

    pub fn with_event_sink(mut self, sink: LoopEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn protocol(&self) -> Protocol {
        self.interpreter.protocol()
    }

    /// Run until the model terminates or the iteration budget is spent.
    ///
    /// Never fails: provider errors, malformed replies and tool errors are
    /// written into the conversation for the model to see on its next turn.
    pub async fn run(self, task: impl Into<String>) -> RunReport {
        let task = task.into();
        let protocol = self.protocol();
        let emitter = LoopEventEmitter::new(self.run_id, self.event_sink.clone());

        let rules = match &self.rules {
            Some(rules) => rules.clone(),
            None => prompt::system_rules(&self.registry, protocol),
        };
        let mut conversation = Conversation::with_system(rules);
        conversation.append(Turn::user(task.clone()));

        let tools: Option<Vec<ToolDefinition>> =
            (protocol == Protocol::Native).then(|| prompt::action_definitions(&self.registry));
        let generation = self.settings.generation();

        debug!(
            run_id = %self.run_id,
            model = self.provider.model_id(),
            provider = self.provider.provider_name(),
            %protocol,
            max_iterations = self.settings.max_iterations,
            "agent run start"
        );
        emitter.emit(LoopEventPayload::Started { task });

        let mut state = LoopState::Running;
        let mut summary = None;
        let mut iterations = 0usize;
        let mut usage = Usage::default();

        while iterations < self.settings.max_iterations {
            let iteration = iterations + 1;
            emitter.emit(LoopEventPayload::Thinking { iteration });

            let request = CompletionRequest {
                turns: conversation.as_prompt_sequence().to_vec(),
                settings: generation.clone(),
                tools: tools.clone(),
            };
            let (response, action) = match self.provider.complete(&request).await {
                Ok(completion) => {
                    usage.merge(&completion.usage);
                    let action = self.interpreter.interpret_response(&completion);
                    (completion.transcript(), action)
                }
                Err(e) => {
                    warn!(
                        run_id = %self.run_id,
                        iteration,
                        category = %e.category(),
                        error = %e,
                        "completion failed"
                    );
                    emitter.emit(LoopEventPayload::ProviderFailed {
                        iteration,
                        message: e.to_string(),
                    });
                    failed_completion(&e)
                }
            };
            emitter.emit(LoopEventPayload::Response {
                iteration,
                text: response.clone(),
            });
            iterations = iteration;

            if action.is_terminate() {
                if let Some(message) = terminate_message(&action) {
                    debug!(run_id = %self.run_id, iteration, "terminated by model");
                    summary = Some(message);
                    state = LoopState::TerminatedByTool;
                    break;
                }
            }

            let result = self.execute(&action).await;
            debug!(
                run_id = %self.run_id,
                iteration,
                tool = action.tool_name(),
                error = result.is_error(),
                "action dispatched"
            );
            emitter.emit(LoopEventPayload::ActionResult {
                iteration,
                tool_name: action.tool_name().to_string(),
                result: result.clone(),
            });

            conversation.extend([
                Turn::assistant(response),
                Turn::tool_result(result.to_json_string()),
            ]);
        }

        if state == LoopState::Running {
            state = LoopState::TerminatedByIterationLimit;
            debug!(run_id = %self.run_id, iterations, "iteration limit reached");
        }
        emitter.emit(LoopEventPayload::Finished {
            state,
            summary: summary.clone(),
        });

        RunReport {
            run_id: self.run_id,
            state,
            summary,
            iterations,
            usage,
            conversation,
            finished_at: Utc::now(),
        }
    }

    async fn execute(&self, action: &Action) -> ToolResult {
        match action {
            Action::Error { message } => ToolResult::error(message.clone()),
            // Only reached when the summary is missing.
            Action::Call { .. } if action.is_terminate() => {
                ToolResult::error(TERMINATE_WITHOUT_MESSAGE)
            }
            Action::Call { tool_name, args } => self.registry.dispatch(tool_name, args).await,
        }
    }
}

/// Transcript and action recorded for a completion that never arrived.
fn failed_completion(error: &SkiffError) -> (String, Action) {
    let text = format!("Error: {error}");
    let action = Action::error(format!(
        "{text}. The model request failed; respond again with a JSON tool invocation."
    ));
    (text, action)
}

fn terminate_message(action: &Action) -> Option<String> {
    match action {
        Action::Call { args, .. } => match args.get("message") {
            Some(Value::String(message)) => Some(message.clone()),
            _ => None,
        },
        Action::Error { .. } => None,
    }
}

impl std::fmt::Debug for AgentLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentLoop")
            .field("run_id", &self.run_id)
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("protocol", &self.protocol())
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish()
    }
}
