//! Agent persona types.

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Who an agent is and what it may use.
///
/// The flow an agent runs is bound separately (see the agent crate); this is
/// the plain, serializable part that configuration files describe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Display name (used by flows that address the user directly)
    #[serde(default)]
    pub name: String,

    /// Persona lines, each becoming one system message
    #[serde(default)]
    pub role: Vec<String>,

    /// Agent-specific guideline lines, appended after the flow's guidelines
    #[serde(default)]
    pub guidelines: Vec<String>,

    /// Names of the registered tools this agent may call
    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_role<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.role = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_guidelines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guidelines = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = names.into_iter().map(Into::into).collect();
        self
    }

    /// The system preamble: role lines, then flow guidelines, then agent guidelines.
    pub fn system_preamble(&self, flow_guidelines: &[String]) -> Vec<Message> {
        self.role
            .iter()
            .chain(flow_guidelines)
            .chain(&self.guidelines)
            .map(Message::system)
            .collect()
    }
}
