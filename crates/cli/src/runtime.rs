//! Startup wiring: configuration → connections → tools → flows → agents.

use agentflow_agent::{Agent, FlowRegistry};
use agentflow_config::AppConfig;
use agentflow_core::event::{DomainEvent, EventBus};
use agentflow_core::{Error, Result, ToolRegistry, normalize_name};
use agentflow_providers::ConnectionRegistry;
use agentflow_tools::Console;
use std::sync::Arc;

/// Everything built from configuration, read-only once constructed.
pub struct Runtime {
    pub config: AppConfig,
    pub connections: ConnectionRegistry,
    pub tools: Arc<ToolRegistry>,
    pub flows: FlowRegistry,
    pub events: Arc<EventBus>,
    /// The terminal, shared by the chat loop and `get_user_input`
    pub console: Arc<Console>,
}

impl Runtime {
    /// Load configuration from disk and build every registry.
    pub fn load() -> Result<Self> {
        let config = AppConfig::load()?;
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let events = Arc::new(EventBus::default());
        let connections = agentflow_providers::build_from_config(&config)?;
        let console = Arc::new(Console::stdio());
        let tools = Arc::new(agentflow_tools::registry_with_console(Arc::clone(&console)));
        let flows = agentflow_agent::build_from_config(
            &config,
            &connections,
            Arc::clone(&tools),
            Some(Arc::clone(&events)),
        )?;

        Ok(Self {
            config,
            connections,
            tools,
            flows,
            events,
            console,
        })
    }

    /// Build the named agent, or the configured default.
    pub fn agent(&self, name: Option<&str>) -> Result<Agent> {
        let name = normalize_name(name.unwrap_or(&self.config.default_agent));
        let agent_config = self
            .config
            .agents
            .get(&name)
            .ok_or_else(|| Error::config(format!("Agent '{name}' not found in configuration.")))?;
        Agent::from_profile(agent_config.profile(&name), &self.flows, &agent_config.flow)
    }

    /// Forward domain events to the debug log until the bus closes.
    pub fn log_events(&self) -> tokio::task::JoinHandle<()> {
        let mut rx = self.events.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => match event.as_ref() {
                        DomainEvent::CompletionReceived {
                            agent, model, tool_calls, tokens_used, ..
                        } => {
                            tracing::debug!(%agent, %model, tool_calls, ?tokens_used, "Completion received");
                        }
                        DomainEvent::ToolExecuted {
                            tool_name, call_id, success, duration_ms, ..
                        } => {
                            tracing::debug!(tool = %tool_name, %call_id, success, duration_ms, "Tool executed");
                        }
                        DomainEvent::TurnCompleted {
                            agent, rounds, tool_calls, cap_reached, ..
                        } => {
                            tracing::debug!(%agent, rounds, tool_calls, cap_reached, "Turn completed");
                        }
                    },
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event log fell behind");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
