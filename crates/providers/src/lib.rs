//! Completion clients for AgentFlow.
//!
//! All clients implement `agentflow_core::CompletionClient`. The registry
//! wires each configured connection to an OpenAI-compatible client wrapped
//! in the retry policy.

pub mod openai_compat;
pub mod registry;
pub mod retry;

pub use openai_compat::OpenAiCompatClient;
pub use registry::{ConnectionEntry, ConnectionRegistry, build_from_config};
pub use retry::{RetryPolicy, RetryingClient};
