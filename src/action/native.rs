use serde_json::{Map, Value};
use tracing::debug;

use super::{Action, ResponseInterpreter, NOT_AN_INVOCATION_MESSAGE};
use crate::config::Protocol;
use crate::provider::Completion;

/// Reads the provider-native tool call attached to a completion.
///
/// A reply without a tool call, or whose argument string does not decode to a
/// JSON object, becomes an error action like any other malformed reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCallInterpreter;

impl NativeCallInterpreter {
    fn decode_arguments(raw: &str) -> Result<Map<String, Value>, String> {
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(args)) => Ok(args),
            Ok(Value::Null) => Ok(Map::new()),
            Ok(other) => Err(format!("arguments must be a JSON object, got {other}")),
            Err(e) => Err(e.to_string()),
        }
    }
}

impl ResponseInterpreter for NativeCallInterpreter {
    fn protocol(&self) -> Protocol {
        Protocol::Native
    }

    fn interpret_response(&self, response: &Completion) -> Action {
        let Some(call) = &response.tool_call else {
            return Action::error(NOT_AN_INVOCATION_MESSAGE);
        };
        match Self::decode_arguments(&call.arguments) {
            Ok(args) => Action::call(call.name.clone(), args),
            Err(reason) => {
                debug!(tool = %call.name, %reason, "undecodable tool call arguments");
                Action::error(format!(
                    "Invalid arguments for {}: {reason}. You must respond with a JSON tool invocation.",
                    call.name
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_tool_call() {
        let completion = Completion::tool_call("read_file", r#"{"file_name":"a.py"}"#);
        assert_eq!(
            NativeCallInterpreter.interpret_response(&completion),
            Action::call(
                "read_file",
                json!({"file_name": "a.py"}).as_object().cloned().unwrap()
            )
        );
    }

    #[test]
    fn empty_arguments_are_empty_map() {
        let completion = Completion::tool_call("list_files", "");
        assert_eq!(
            NativeCallInterpreter.interpret_response(&completion),
            Action::call("list_files", Map::new())
        );
    }

    #[test]
    fn text_only_reply_is_error() {
        let action = NativeCallInterpreter.interpret_response(&Completion::text("hello"));
        assert_eq!(action, Action::error(NOT_AN_INVOCATION_MESSAGE));
    }

    #[test]
    fn undecodable_arguments_are_error() {
        let completion = Completion::tool_call("read_file", "{file_name: a.py");
        let action = NativeCallInterpreter.interpret_response(&completion);
        assert!(action.is_error());
        let Action::Error { message } = action else {
            unreachable!()
        };
        assert!(message.starts_with("Invalid arguments for read_file"));
    }

    #[test]
    fn non_object_arguments_are_error() {
        let completion = Completion::tool_call("read_file", "[1]");
        assert!(NativeCallInterpreter.interpret_response(&completion).is_error());
    }
}
