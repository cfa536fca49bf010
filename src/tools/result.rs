//! Outcome of one dispatched action.

use serde::{Deserialize, Serialize};

/// `{"result": value}` or `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolResult {
    Result(serde_json::Value),
    Error(String),
}

impl ToolResult {
    pub fn ok(value: impl Into<serde_json::Value>) -> Self {
        Self::Result(value.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// JSON text appended to the conversation.
    pub fn to_json_string(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            // Serializing a `Value` or a `String` cannot fail; keep the error shape anyway.
            Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_single_key_object() {
        assert_eq!(
            ToolResult::ok(serde_json::json!(["a.py", "b.py"])).to_json_string(),
            r#"{"result":["a.py","b.py"]}"#
        );
        assert_eq!(
            ToolResult::error("Unknown action: fly").to_json_string(),
            r#"{"error":"Unknown action: fly"}"#
        );
    }

    #[test]
    fn deserializes_back() {
        let parsed: ToolResult = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert!(parsed.is_error());
    }
}
