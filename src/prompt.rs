//! System rules given to the model at the start of every run.

use serde_json::json;

use crate::config::Protocol;
use crate::provider::ToolDefinition;
use crate::tools::registry::TERMINATE;
use crate::tools::ToolRegistry;

const PREAMBLE: &str = "You are an AI agent that can perform tasks by using available tools.";

/// Definition of the loop-level `terminate` action.
pub fn terminate_definition() -> ToolDefinition {
    ToolDefinition {
        name: TERMINATE.to_string(),
        description: "Ends the agent loop and provides a summary of the task.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "Summary message to return to the user."
                }
            },
            "required": ["message"]
        }),
    }
}

/// Registered tools followed by `terminate`.
pub fn action_definitions(registry: &ToolRegistry) -> Vec<ToolDefinition> {
    let mut definitions = registry.definitions();
    definitions.push(terminate_definition());
    definitions
}

/// Render the system rules for `protocol`.
pub fn system_rules(registry: &ToolRegistry, protocol: Protocol) -> String {
    match protocol {
        Protocol::Fenced => fenced_rules(registry),
        Protocol::Native => native_rules(),
    }
}

fn fenced_rules(registry: &ToolRegistry) -> String {
    let listing: Vec<_> = action_definitions(registry)
        .into_iter()
        .map(|d| {
            json!({
                "tool_name": d.name,
                "description": d.description,
                "parameters": d.parameters,
            })
        })
        .collect();
    let listing = serde_json::to_string_pretty(&listing).unwrap_or_else(|_| "[]".to_string());

    format!(
        "{PREAMBLE}

Available tools:

{listing}

If a user asks about files, list them before reading.
When the task is complete, use the 'terminate' tool with a summary for the user.

Important!!! Every response MUST have an action.
You must ALWAYS respond in this format:

<Stop and think step by step. Insert a short description of your reasoning here.>

```action
{{
    \"tool_name\": \"insert tool_name\",
    \"args\": {{...fill in any required arguments here...}}
}}
```
"
    )
}

fn native_rules() -> String {
    format!(
        "{PREAMBLE}

Every response MUST call exactly one tool. If a user asks about files, list them \
before reading. When the task is complete, call 'terminate' with a summary for the user."
    )
}
