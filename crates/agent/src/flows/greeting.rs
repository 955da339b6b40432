//! Greeting flow — answers without calling a model.

use agentflow_core::{Result, normalize_name};
use async_trait::async_trait;

use crate::agent::Agent;
use crate::flow::AgentFlow;

/// Greets the user by the agent's name and echoes the inputs back.
///
/// Leaves the agent's memory untouched.
pub struct GreetingFlow {
    name: String,
    description: String,
}

impl GreetingFlow {
    pub fn new(name: &str) -> Self {
        Self {
            name: normalize_name(name),
            description: "Replies with a greeting without calling a model.".into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl AgentFlow for GreetingFlow {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, agent: &mut Agent, inputs: &[String]) -> Result<String> {
        Ok(format!(
            "Hello! I am {}, your AI assistant.\nI see your question: {}",
            agent.name(),
            inputs.join("\n")
        ))
    }
}
