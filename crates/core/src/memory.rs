//! Conversation memory — the ordered message log an agent owns.
//!
//! Memory is append-only: messages are never edited or removed in place.
//! Starting over means building a fresh `Memory` (see `Agent::reset`).
//!
//! Appending enforces the tool-call pairing rule: a tool message must
//! answer the next outstanding call of the most recent assistant turn,
//! so responses land in the same relative order their requests were issued.

use std::collections::VecDeque;

use crate::error::MemoryError;
use crate::message::{Message, Role};

/// An ordered, append-only sequence of messages.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    messages: Vec<Message>,
    /// Tool-call ids of the latest assistant turn not yet answered, in issue order.
    outstanding: VecDeque<String>,
}

impl Memory {
    /// Create a memory seeded with a preamble (normally system messages).
    pub fn new(preamble: Vec<Message>) -> Self {
        let mut memory = Self::default();
        for message in preamble {
            if let Err(e) = memory.append(message) {
                tracing::warn!("Dropping invalid preamble message: {e}");
            }
        }
        memory
    }

    /// Append a message to the log.
    pub fn append(&mut self, message: Message) -> Result<(), MemoryError> {
        match message.role {
            Role::Tool => {
                let id = message
                    .tool_call_id
                    .as_deref()
                    .ok_or(MemoryError::MissingToolCallId)?;
                match self.outstanding.front() {
                    Some(expected) if expected == id => {
                        self.outstanding.pop_front();
                    }
                    expected => {
                        return Err(MemoryError::UnexpectedToolResponse {
                            tool_call_id: id.to_string(),
                            expected: expected
                                .map(|e| format!("'{e}'"))
                                .unwrap_or_else(|| "none".into()),
                        });
                    }
                }
            }
            Role::Assistant if !message.tool_calls.is_empty() => {
                // A new request batch supersedes any calls left unanswered
                // (e.g. when a flow stopped at its iteration cap).
                self.outstanding = message.tool_calls.iter().map(|tc| tc.id.clone()).collect();
            }
            _ => {}
        }
        self.messages.push(message);
        Ok(())
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Tool calls of the latest assistant turn that have no response yet.
    pub fn outstanding_tool_calls(&self) -> impl Iterator<Item = &str> {
        self.outstanding.iter().map(String::as_str)
    }
}
