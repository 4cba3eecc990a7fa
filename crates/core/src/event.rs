//! Domain event system: lets observers follow a turn without touching it.
//!
//! The agent loop publishes events as it moves between states. Nothing in
//! the loop depends on anyone listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The Completion Service answered a user-facing request
    CompletionReceived {
        conversation_id: String,
        model: String,
        tokens_used: Option<u32>,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        tool_name: String,
        output_chars: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Older messages were folded into the running summary
    HistoryCompacted {
        conversation_id: String,
        dropped: usize,
        retained: usize,
        timestamp: DateTime<Utc>,
    },

    /// A turn ended with an answer
    TurnCompleted {
        conversation_id: String,
        tool_turns: u32,
        timestamp: DateTime<Utc>,
    },

    /// A turn used up its tool-call budget
    TurnBudgetExhausted {
        conversation_id: String,
        tool_turns: u32,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ToolExecuted {
            tool_name: "read-entry".into(),
            output_chars: 120,
            duration_ms: 3,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolExecuted { tool_name, output_chars, .. } => {
                assert_eq!(tool_name, "read-entry");
                assert_eq!(*output_chars, 120);
            }
            _ => panic!("Expected ToolExecuted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::TurnCompleted {
            conversation_id: "c1".into(),
            tool_turns: 0,
            timestamp: Utc::now(),
        });
    }
}
