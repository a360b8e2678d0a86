//! Event port: fire-and-forget notifications of core state transitions.
//!
//! Listeners (UI entities, automations, calendar bridges) subscribe outside
//! the core; the core never blocks on them and never observes their failures.

use std::sync::Mutex;

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ChoreCreated,
    ChoreCompleted,
    ApprovalCreated,
    ChoreApproved,
    ChoreRejected,
    RewardClaimed,
    RewardAchieved,
    PointsChanged,
    CalendarEventRequested,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub payload: Value,
}

impl Event {
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    pub fn points_changed(child_id: &str, delta: i64, balance: i64) -> Self {
        Self::new(
            EventKind::PointsChanged,
            json!({ "child_id": child_id, "delta": delta, "balance": balance }),
        )
    }
}

/// Sink for core events. Implementations must not panic; emission failures
/// are the listener's problem, not the core's.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn emit(&self, event: &Event) {
        (**self).emit(event)
    }
}

/// Logs every event through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &Event) {
        tracing::info!(kind = ?event.kind, payload = %event.payload, "core event");
    }
}

/// Discards events; useful when no listener is wired up.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &Event) {}
}

/// Records events for inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_captures_in_order() {
        let sink = RecordingSink::new();
        sink.emit(&Event::points_changed("alice", 5, 5));
        sink.emit(&Event::new(EventKind::ChoreCreated, json!({})));
        assert_eq!(
            sink.kinds(),
            vec![EventKind::PointsChanged, EventKind::ChoreCreated]
        );
    }

    #[test]
    fn event_kind_serializes_snake_case() {
        let kind = serde_json::to_string(&EventKind::ChoreApproved).unwrap();
        assert_eq!(kind, "\"chore_approved\"");
    }
}
