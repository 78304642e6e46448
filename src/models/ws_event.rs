//! WebSocket event types for real-time run updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// WebSocket event sent to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "snake_case")]
pub enum WsEvent {
    /// A run changed; clients re-fetch it by id.
    RunUpdated(RunUpdatedPayload),
}

/// Payload for run_updated event. Carries only the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunUpdatedPayload {
    pub run_id: String,
}

/// Wrapper that includes timestamp with every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsEventMessage {
    #[serde(flatten)]
    pub event: WsEvent,
    pub timestamp: DateTime<Utc>,
}

impl WsEventMessage {
    /// Create a new event message with the current timestamp.
    pub fn new(event: WsEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }
}

impl WsEvent {
    pub fn run_updated(run_id: &str) -> Self {
        WsEvent::RunUpdated(RunUpdatedPayload {
            run_id: run_id.to_string(),
        })
    }
}
