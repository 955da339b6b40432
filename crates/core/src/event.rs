//! Domain event system — observe a running flow without coupling to it.
//!
//! Flows and the tool dispatcher publish events as they work; a CLI, a test,
//! or a metrics sink can subscribe and react.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The model answered a completion request
    CompletionReceived {
        agent: String,
        model: String,
        tool_calls: usize,
        tokens_used: Option<u32>,
        timestamp: DateTime<Utc>,
    },

    /// A tool call finished (successfully or with an in-band error)
    ToolExecuted {
        tool_name: String,
        call_id: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A user input was fully resolved by a flow
    TurnCompleted {
        agent: String,
        rounds: u32,
        tool_calls: usize,
        cap_reached: bool,
        timestamp: DateTime<Utc>,
    },
}

/// Multi-consumer pub/sub over `tokio::sync::broadcast`.
///
/// Publishing never blocks; a subscriber that falls more than `capacity`
/// events behind skips the oldest ones.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Fan `event` out to every live subscriber.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Receive events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
