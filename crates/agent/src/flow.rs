//! The agent flow contract: a conversation strategy an agent executes.

use agentflow_core::Result;
use async_trait::async_trait;

use crate::agent::Agent;

/// A conversation strategy.
///
/// A flow is shared (behind an `Arc`) by every agent bound to it and holds
/// no per-conversation state; everything it mutates lives in the [`Agent`]
/// it is handed.
#[async_trait]
pub trait AgentFlow: Send + Sync {
    /// The normalized name the flow is registered under.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Guideline lines injected into the system preamble of every agent
    /// bound to this flow, between the agent's role and its own guidelines.
    fn guidelines(&self) -> &[String] {
        &[]
    }

    /// Run the strategy over `inputs` and return the final answer text.
    async fn execute(&self, agent: &mut Agent, inputs: &[String]) -> Result<String>;
}
