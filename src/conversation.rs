//! Append-only conversation log.
//!
//! A [`Conversation`] starts with a fixed block of leading turns (the system
//! rules) and only ever grows at the end. There is no API for removing,
//! reordering or editing a turn once it has been appended.
//!
//! Growth is unbounded: every iteration of a run adds two turns and nothing
//! is ever compacted.

use crate::types::Turn;

/// Ordered, append-only sequence of turns sent to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
    rules_len: usize,
}

impl Conversation {
    /// Create a conversation whose leading turns are `rules`.
    pub fn new(rules: Vec<Turn>) -> Self {
        let rules_len = rules.len();
        Self {
            turns: rules,
            rules_len,
        }
    }

    /// Create a conversation led by a single system turn.
    pub fn with_system(rules: impl Into<String>) -> Self {
        Self::new(vec![Turn::system(rules)])
    }

    /// Append a turn at the end.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Append several turns, preserving their order.
    pub fn extend(&mut self, turns: impl IntoIterator<Item = Turn>) {
        self.turns.extend(turns);
    }

    /// Full ordered sequence for submission to the model, rules first.
    pub fn as_prompt_sequence(&self) -> &[Turn] {
        &self.turns
    }

    /// The fixed leading rule turns.
    pub fn rules(&self) -> &[Turn] {
        &self.turns[..self.rules_len]
    }

    /// Turns appended after the rules.
    pub fn history(&self) -> &[Turn] {
        &self.turns[self.rules_len..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
