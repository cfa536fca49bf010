//! Diagnostic events emitted while a run progresses.
//!
//! Events are for display and logging only. The run's result is the
//! [`RunReport`](super::RunReport) returned by the loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::tools::ToolResult;

use super::types::{LoopState, RunId};

/// Callback receiving loop events.
pub type LoopEventSink = Arc<dyn Fn(LoopEvent) + Send + Sync>;

/// Concrete event payloads emitted by the agent loop.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEventPayload {
    Started {
        task: String,
    },
    /// A completion is about to be requested.
    Thinking {
        iteration: usize,
    },
    Response {
        iteration: usize,
        text: String,
    },
    ProviderFailed {
        iteration: usize,
        message: String,
    },
    ActionResult {
        iteration: usize,
        tool_name: String,
        result: ToolResult,
    },
    Finished {
        state: LoopState,
        summary: Option<String>,
    },
}

/// Envelope for loop events.
#[derive(Debug, Clone, Serialize)]
pub struct LoopEvent {
    pub run_id: RunId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: LoopEventPayload,
}

pub(crate) struct LoopEventEmitter {
    run_id: RunId,
    seq: AtomicU64,
    sink: Option<LoopEventSink>,
}

impl LoopEventEmitter {
    pub(crate) fn new(run_id: RunId, sink: Option<LoopEventSink>) -> Self {
        Self {
            run_id,
            seq: AtomicU64::new(1),
            sink,
        }
    }

    pub(crate) fn emit(&self, payload: LoopEventPayload) {
        let Some(sink) = &self.sink else { return };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(LoopEvent {
            run_id: self.run_id,
            seq,
            timestamp: Utc::now(),
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn emitter_numbers_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink: LoopEventSink = Arc::new(move |event: LoopEvent| sink_seen.lock().unwrap().push(event.seq));

        let emitter = LoopEventEmitter::new(RunId::new_v4(), Some(sink));
        emitter.emit(LoopEventPayload::Started { task: "t".into() });
        emitter.emit(LoopEventPayload::Thinking { iteration: 1 });

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let json = serde_json::to_value(LoopEventPayload::Thinking { iteration: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "thinking", "iteration": 2}));
    }
}
