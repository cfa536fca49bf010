use regex::Regex;
use tracing::debug;

use super::{action_from_invocation, Action, ResponseInterpreter, INVALID_JSON_MESSAGE};
use crate::config::Protocol;
use crate::provider::Completion;

/// Bodies of all ```` ```tag ```` blocks in `text`, trimmed, empty ones dropped.
pub fn extract_fenced_blocks(text: &str, tag: &str) -> Vec<String> {
    match block_pattern(tag) {
        Some(pattern) => blocks(&pattern, text),
        None => Vec::new(),
    }
}

fn block_pattern(tag: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?s)```{}\s*\n(.*?)```", regex::escape(tag))).ok()
}

fn blocks(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| !body.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads a fenced `action` block from the reply text.
///
/// The first block wins. With no block the whole reply is the candidate, so
/// plain prose comes back as an invalid-JSON error.
#[derive(Debug, Clone)]
pub struct FencedBlockInterpreter {
    pattern: Option<Regex>,
}

impl FencedBlockInterpreter {
    pub const TAG: &'static str = "action";

    pub fn new() -> Self {
        Self {
            pattern: block_pattern(Self::TAG),
        }
    }

    /// Interpret raw reply text.
    pub fn interpret_text(&self, text: &str) -> Action {
        let first = self
            .pattern
            .as_ref()
            .and_then(|p| blocks(p, text).into_iter().next());
        let candidate = first.as_deref().unwrap_or_else(|| text.trim());

        match serde_json::from_str(candidate) {
            Ok(value) => action_from_invocation(value),
            Err(e) => {
                debug!(error = %e, "reply is not a JSON tool invocation");
                Action::error(INVALID_JSON_MESSAGE)
            }
        }
    }
}

impl Default for FencedBlockInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseInterpreter for FencedBlockInterpreter {
    fn protocol(&self) -> Protocol {
        Protocol::Fenced
    }

    fn interpret_response(&self, response: &Completion) -> Action {
        self.interpret_text(&response.text)
    }
}
