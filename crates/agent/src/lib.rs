//! Agents and agent flows for AgentFlow.
//!
//! An [`Agent`] is a persona (role lines, guidelines, a subset of registered
//! tools) with its own conversation memory, bound to one [`AgentFlow`]. The
//! flow decides how a conversation runs. The built-in [`ReactFlow`] follows a
//! **Reason → Act → Observe** cycle:
//!
//! 1. **Receive** a user input and append it to memory
//! 2. **Ask the model** via the flow's connection, offering the agent's tools
//! 3. **If tool calls**: dispatch them concurrently, append the results, go to 2
//! 4. **If text**: that is the answer
//!
//! The loop also stops after `max_iterations` rounds of tool dispatch.

pub mod agent;
pub mod flow;
pub mod flows;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transcript;

pub use agent::{Agent, AgentBuilder};
pub use flow::AgentFlow;
pub use flows::{FlowRegistry, GreetingFlow, ReactFlow, TurnOutcome, build_from_config};
pub use transcript::render_transcript;
