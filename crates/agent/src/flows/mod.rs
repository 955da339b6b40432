//! Built-in agent flows and the registry they are looked up in.

pub mod greeting;
pub mod react;

use agentflow_config::{AppConfig, FlowKind};
use agentflow_core::event::EventBus;
use agentflow_core::{Error, Result, ToolRegistry, normalize_name};
use agentflow_providers::ConnectionRegistry;
use agentflow_tools::ToolDispatcher;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::flow::AgentFlow;

pub use greeting::GreetingFlow;
pub use react::{ReactFlow, TurnOutcome};

/// Normalized name → flow. Built at startup, read-only afterwards.
#[derive(Default, Clone)]
pub struct FlowRegistry {
    flows: HashMap<String, Arc<dyn AgentFlow>>,
}

impl std::fmt::Debug for FlowRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowRegistry")
            .field("flows", &self.flows.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, flow: Arc<dyn AgentFlow>) {
        let name = normalize_name(flow.name());
        if self.flows.insert(name.clone(), flow).is_some() {
            tracing::warn!(flow = %name, "Agent flow re-registered, previous definition replaced");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentFlow>> {
        self.flows.get(&normalize_name(name)).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.flows.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Build every configured flow.
///
/// ReAct flows get their connection's client and a dispatcher over `tools`
/// with the configured per-call timeout.
pub fn build_from_config(
    config: &AppConfig,
    connections: &ConnectionRegistry,
    tools: Arc<ToolRegistry>,
    events: Option<Arc<EventBus>>,
) -> Result<FlowRegistry> {
    let timeout = match config.tools.timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let mut registry = FlowRegistry::new();

    for (name, flow_config) in &config.flows {
        let flow: Arc<dyn AgentFlow> = match flow_config.kind {
            FlowKind::Greeting => {
                let mut flow = GreetingFlow::new(name);
                if !flow_config.description.is_empty() {
                    flow = flow.with_description(flow_config.description.clone());
                }
                Arc::new(flow)
            }
            FlowKind::React => {
                let conn_name = flow_config.connection.as_deref().ok_or_else(|| {
                    Error::config(format!("Agent flow '{name}' names no model connection."))
                })?;
                let entry = connections.get(conn_name).ok_or_else(|| {
                    Error::config(format!(
                        "Model connection '{conn_name}' not found in registered connections."
                    ))
                })?;

                let mut dispatcher = ToolDispatcher::new(Arc::clone(&tools)).with_timeout(timeout);
                if let Some(events) = &events {
                    dispatcher = dispatcher.with_events(Arc::clone(events));
                }

                let mut flow = ReactFlow::new(
                    name,
                    entry.connection.clone(),
                    Arc::clone(&entry.client),
                    dispatcher,
                )
                .with_guidelines(flow_config.guidelines.clone())
                .with_max_iterations(flow_config.max_iterations)
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens);
                if !flow_config.description.is_empty() {
                    flow = flow.with_description(flow_config.description.clone());
                }
                if let Some(events) = &events {
                    flow = flow.with_events(Arc::clone(events));
                }
                Arc::new(flow)
            }
        };

        tracing::debug!(flow = %flow.name(), kind = ?flow_config.kind, "Registered agent flow");
        registry.register(flow);
    }

    Ok(registry)
}
