//! Agents: a persona bound to its own memory and to one flow.

use agentflow_core::{AgentProfile, Error, Memory, Result};
use std::sync::Arc;
use tracing::debug;

use crate::flow::AgentFlow;
use crate::flows::FlowRegistry;

/// A persona (role, guidelines, tool subset) with its own conversation memory,
/// bound to exactly one [`AgentFlow`].
///
/// Concurrent conversations use separate `Agent` instances; a flow may be
/// shared between them.
pub struct Agent {
    profile: AgentProfile,
    flow: Arc<dyn AgentFlow>,
    memory: Memory,
}

impl Agent {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    /// Bind a profile to the flow registered under `flow_name`.
    pub fn from_profile(profile: AgentProfile, flows: &FlowRegistry, flow_name: &str) -> Result<Self> {
        let flow = flows.get(flow_name).ok_or_else(|| {
            Error::config(format!(
                "Agent flow '{flow_name}' not found in registered agent flows."
            ))
        })?;
        Ok(Self::bind(profile, flow))
    }

    fn bind(profile: AgentProfile, flow: Arc<dyn AgentFlow>) -> Self {
        let memory = Memory::new(profile.system_preamble(flow.guidelines()));
        Self { profile, flow, memory }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Names of the tools this agent may call.
    pub fn tools(&self) -> &[String] {
        &self.profile.tools
    }

    pub fn flow(&self) -> &Arc<dyn AgentFlow> {
        &self.flow
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Flows append to memory through this.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Execute the bound flow over `inputs` and return its final answer.
    pub async fn run_conversation(&mut self, inputs: &[String]) -> Result<String> {
        let flow = Arc::clone(&self.flow);
        debug!(agent = %self.profile.name, flow = %flow.name(), inputs = inputs.len(), "Running conversation");
        flow.execute(self, inputs).await
    }

    /// Discard the conversation and rebuild the system preamble.
    pub fn reset(&mut self) {
        self.memory = Memory::new(self.profile.system_preamble(self.flow.guidelines()));
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("profile", &self.profile)
            .field("flow", &self.flow.name())
            .field("messages", &self.memory.len())
            .finish()
    }
}

/// Builds an [`Agent`]. A flow must be supplied.
pub struct AgentBuilder {
    profile: AgentProfile,
    flow: Option<Arc<dyn AgentFlow>>,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            profile: AgentProfile::new(name),
            flow: None,
        }
    }

    pub fn with_role<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profile = self.profile.with_role(lines);
        self
    }

    pub fn with_guidelines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profile = self.profile.with_guidelines(lines);
        self
    }

    pub fn with_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profile = self.profile.with_tools(names);
        self
    }

    pub fn with_flow(mut self, flow: Arc<dyn AgentFlow>) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let flow = self.flow.ok_or_else(|| {
            Error::config(format!("Agent '{}' has no agent flow assigned.", self.profile.name))
        })?;
        Ok(Agent::bind(self.profile, flow))
    }
}
