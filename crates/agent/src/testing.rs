//! Scripted completion client for tests (`testing` feature).
//!
//! Replays a fixed list of assistant replies and records every request it
//! receives, so flows can be driven without a network.

use agentflow_core::error::ProviderError;
use agentflow_core::provider::{Completion, CompletionClient, CompletionRequest, Usage};
use agentflow_core::{Message, MessageToolCall};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

pub struct ScriptedClient {
    replies: Mutex<VecDeque<Completion>>,
    repeat: Option<Completion>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    /// Replies in order; an exhausted script answers with an error.
    pub fn new(replies: Vec<Completion>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// The same reply forever.
    pub fn repeating(reply: Completion) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            repeat: Some(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        lock(&self.requests).push(request);
        if let Some(reply) = lock(&self.replies).pop_front() {
            return Ok(reply);
        }
        self.repeat
            .clone()
            .ok_or_else(|| ProviderError::InvalidResponse("scripted client has no more replies".into()))
    }
}

/// A plain text reply.
pub fn text_reply(text: &str) -> Completion {
    completion(Message::assistant(text))
}

/// A reply that requests tools and carries no text.
pub fn tool_reply(calls: Vec<MessageToolCall>) -> Completion {
    completion(Message::assistant_tool_calls(None, calls))
}

/// A tool call with JSON-encoded arguments.
pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> MessageToolCall {
    MessageToolCall::new(id, name, arguments.to_string())
}

fn completion(message: Message) -> Completion {
    Completion {
        message,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
