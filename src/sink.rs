//! Observer interface for pipeline log lines and status text
//!
//! The pipeline never talks to a UI directly. It pushes plain strings through
//! a [`ProgressSink`]; the default sink forwards them as [`Event`]s on a
//! broadcast channel so any number of observers can follow a run from other
//! tasks or threads.

use crate::types::Event;
use tokio::sync::broadcast;

/// Receiver of human-readable pipeline output
///
/// Both methods are fire-and-forget: implementations must return promptly
/// and must not call back into the pipeline.
pub trait ProgressSink: Send + Sync {
    /// Append one line to the run log
    fn emit_log(&self, line: &str);

    /// Replace the current status text
    fn emit_status(&self, text: &str);
}

impl ProgressSink for broadcast::Sender<Event> {
    fn emit_log(&self, line: &str) {
        // No subscribers is fine
        self.send(Event::Log {
            line: line.to_string(),
        })
        .ok();
    }

    fn emit_status(&self, text: &str) {
        self.send(Event::Status {
            text: text.to_string(),
        })
        .ok();
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit_log(&self, _line: &str) {}

    fn emit_status(&self, _text: &str) {}
}
