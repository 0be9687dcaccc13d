//! Port for the structured run transcript.
//!
//! Defines the [`RunEventLogger`] trait for recording what happened during a
//! consultation run (GP decisions, dispatches, tool calls, outcomes) to a
//! machine-readable log.
//!
//! This is separate from `tracing`-based diagnostics: tracing handles
//! human-readable operation logs, while this port captures the run
//! transcript (JSONL).

use serde_json::Value;

/// A structured run event.
///
/// Each event has a type string and a JSON payload with event-specific
/// fields. The adapter adds the timestamp when writing.
pub struct RunEvent {
    /// Event type identifier (e.g., "gp_decision", "tool_call").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl RunEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging run events.
///
/// `log` is synchronous and infallible so it never disturbs the run; write
/// failures are the adapter's concern.
pub trait RunEventLogger: Send + Sync {
    fn log(&self, event: RunEvent);
}

/// No-op implementation for tests and when the transcript is disabled.
pub struct NoRunEventLogger;

impl RunEventLogger for NoRunEventLogger {
    fn log(&self, _event: RunEvent) {}
}
