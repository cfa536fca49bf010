//! Turning one model response into one action.
//!
//! Two protocols sit behind [`ResponseInterpreter`]: a fenced ```` ```action ````
//! JSON block in the reply text ([`FencedBlockInterpreter`]) and a native
//! structured tool call ([`NativeCallInterpreter`]). Interpretation never
//! fails; anything malformed becomes [`Action::Error`].

mod fenced;
mod native;

pub use fenced::{extract_fenced_blocks, FencedBlockInterpreter};
pub use native::NativeCallInterpreter;

use serde_json::{Map, Value};

use crate::config::Protocol;
use crate::provider::Completion;
use crate::tools::registry::{ERROR, TERMINATE};

/// Feedback when the reply is not a JSON object.
pub const INVALID_JSON_MESSAGE: &str =
    "Invalid JSON response. You must respond with a JSON tool invocation.";
/// Feedback when the JSON object is not a tool invocation.
pub const NOT_AN_INVOCATION_MESSAGE: &str = "You must respond with a JSON tool invocation.";

/// What the model asked for in one response.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Invoke `tool_name` with `args`. Includes `terminate`.
    Call {
        tool_name: String,
        args: Map<String, Value>,
    },
    /// The response could not be understood; `message` goes back to the model.
    Error { message: String },
}

impl Action {
    pub fn call(tool_name: impl Into<String>, args: Map<String, Value>) -> Self {
        let tool_name = tool_name.into();
        // A model that names the error sentinel itself is reporting an error.
        if tool_name == ERROR {
            let message = args
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(NOT_AN_INVOCATION_MESSAGE)
                .to_string();
            return Self::Error { message };
        }
        Self::Call { tool_name, args }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Name as seen by the loop; error actions report the `error` sentinel.
    pub fn tool_name(&self) -> &str {
        match self {
            Self::Call { tool_name, .. } => tool_name,
            Self::Error { .. } => ERROR,
        }
    }

    pub fn is_terminate(&self) -> bool {
        self.tool_name() == TERMINATE
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Interprets a completion as an [`Action`].
pub trait ResponseInterpreter: Send + Sync {
    /// Which protocol this interpreter speaks. Native interpreters get tool
    /// definitions sent with every request.
    fn protocol(&self) -> Protocol;

    fn interpret_response(&self, response: &Completion) -> Action;
}

/// Interpreter for the given protocol.
pub fn interpreter_for(protocol: Protocol) -> Box<dyn ResponseInterpreter> {
    match protocol {
        Protocol::Fenced => Box::new(FencedBlockInterpreter::new()),
        Protocol::Native => Box::new(NativeCallInterpreter),
    }
}

/// Validate the `{"tool_name": str, "args": object}` shape.
fn action_from_invocation(value: Value) -> Action {
    let Value::Object(mut object) = value else {
        return Action::error(INVALID_JSON_MESSAGE);
    };
    let tool_name = match object.remove("tool_name") {
        Some(Value::String(name)) => name,
        _ => return Action::error(NOT_AN_INVOCATION_MESSAGE),
    };
    match object.remove("args") {
        Some(Value::Object(args)) => Action::call(tool_name, args),
        _ => Action::error(NOT_AN_INVOCATION_MESSAGE),
    }
}
