//! Core run types for the agent loop.

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::config::{SkiffConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOKENS};
use crate::conversation::Conversation;
use crate::types::{GenerationSettings, Usage};

/// Unique run identifier.
pub type RunId = Uuid;

/// Where a run stands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoopState {
    Running,
    /// The model called `terminate`. The only successful outcome.
    TerminatedByTool,
    /// The iteration budget ran out before `terminate`.
    TerminatedByIterationLimit,
}

/// Limits and sampling settings for one run.
#[derive(Debug, Clone, Builder, PartialEq)]
pub struct LoopSettings {
    #[builder(default = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,
    #[builder(default = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LoopSettings {
    pub fn from_config(config: &SkiffConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub(crate) fn generation(&self) -> GenerationSettings {
        GenerationSettings {
            max_tokens: Some(self.max_tokens),
            temperature: self.temperature,
        }
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub state: LoopState,
    /// The `terminate` message. Absent when the iteration limit ended the run.
    pub summary: Option<String>,
    /// Completions requested, including the terminating one.
    pub iterations: usize,
    pub usage: Usage,
    pub conversation: Conversation,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.state == LoopState::TerminatedByTool
    }
}
