//! Dispatch table from action names to tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::arguments::ToolArguments;
use super::result::ToolResult;
use super::tool::Tool;
use super::validation::validate_arguments;
use crate::error::SkiffError;
use crate::provider::ToolDefinition;

/// Action name that ends a run. Handled by the loop, never dispatched.
pub const TERMINATE: &str = "terminate";
/// Action name carried by malformed responses. Handled by the loop, never dispatched.
pub const ERROR: &str = "error";

/// Names the loop intercepts before dispatch.
pub const RESERVED_NAMES: [&str; 2] = [TERMINATE, ERROR];

/// Maps tool names to tools. Registration order is kept for prompt rendering.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools.
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self, SkiffError> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Add a tool. Reserved and duplicate names are rejected.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), SkiffError> {
        let name = tool.name().to_string();
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(SkiffError::Configuration(format!(
                "'{name}' is reserved and cannot be registered as a tool"
            )));
        }
        if self.index.contains_key(&name) {
            return Err(SkiffError::Configuration(format!(
                "tool '{name}' is already registered"
            )));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tools in registration order.
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions for native tool-calling APIs, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Run the named tool and capture the outcome.
    ///
    /// Never fails: an unknown name, invalid arguments or a tool error all
    /// come back as [`ToolResult::Error`].
    pub async fn dispatch(&self, name: &str, args: &Map<String, Value>) -> ToolResult {
        let Some(tool) = self.get(name) else {
            return ToolResult::error(format!("Unknown action: {name}"));
        };

        if let Err(violation) = validate_arguments(args, &tool.parameters().schema) {
            debug!(tool = name, %violation, "rejected tool arguments");
            return ToolResult::error(format!("Invalid arguments for {name}: {violation}"));
        }

        match tool.execute(&ToolArguments::new(args.clone())).await {
            Ok(value) => ToolResult::Result(value),
            Err(e) => {
                debug!(tool = name, category = %e.category(), error = %e, "tool failed");
                ToolResult::Error(e.feedback_message())
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .finish()
    }
}
