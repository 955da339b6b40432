//! ReAct flow — Reason → Act → Observe, repeated until the model answers.
//!
//! For each user input:
//!
//! 1. Append the input to memory and request a completion with the schemas
//!    of the agent's selected tools.
//! 2. If the reply requests tools, dispatch them all concurrently, append the
//!    results in request order, and request another completion.
//! 3. Stop when a reply requests no tools, or after `max_iterations` rounds of
//!    dispatch. Hitting the cap is not an error: the calls of the last reply
//!    are answered with a "not run" tool message, and that reply's content is
//!    the answer.

use agentflow_core::event::{DomainEvent, EventBus};
use agentflow_core::provider::{CompletionClient, CompletionRequest, ToolDefinition};
use agentflow_core::tool::ToolCall;
use agentflow_core::{Connection, Message, Result, normalize_name};
use agentflow_tools::ToolDispatcher;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::flow::AgentFlow;
use crate::transcript::render_transcript;

/// Default cap on tool rounds per user input.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

pub struct ReactFlow {
    name: String,
    description: String,
    guidelines: Vec<String>,
    connection: Connection,
    client: Arc<dyn CompletionClient>,
    dispatcher: ToolDispatcher,
    max_iterations: u32,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    events: Option<Arc<EventBus>>,
}

/// What one user input cost and produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Content of the last assistant reply ("" if it had none)
    pub answer: String,
    /// Rounds of tool dispatch performed
    pub rounds: u32,
    /// Tool calls dispatched across all rounds
    pub tool_calls: usize,
    /// Whether the loop stopped because of `max_iterations`
    pub cap_reached: bool,
}

impl ReactFlow {
    pub fn new(
        name: &str,
        connection: Connection,
        client: Arc<dyn CompletionClient>,
        dispatcher: ToolDispatcher,
    ) -> Self {
        Self {
            name: normalize_name(name),
            description: "Reason + act: think, call tools, observe, repeat until done.".into(),
            guidelines: Vec::new(),
            connection,
            client,
            dispatcher,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: None,
            max_tokens: None,
            events: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_guidelines(mut self, guidelines: Vec<String>) -> Self {
        self.guidelines = guidelines;
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Resolve one user input.
    pub async fn run_turn(&self, agent: &mut Agent, input: &str) -> Result<TurnOutcome> {
        agent.memory_mut().append(Message::user(input))?;
        let tools = self.dispatcher.registry().schema_for(agent.tools());

        let mut reply = self.request_completion(agent, &tools).await?;
        let mut rounds = 0u32;
        let mut tool_calls = 0usize;
        let mut cap_reached = false;

        while reply.has_tool_calls() {
            if rounds >= self.max_iterations {
                warn!(
                    agent = %agent.name(),
                    max_iterations = self.max_iterations,
                    pending = reply.tool_calls.len(),
                    "ReAct: max iterations reached, returning last reply"
                );
                cap_reached = true;
                // Every tool call in memory must be answered before the next request
                for call in &reply.tool_calls {
                    let name = normalize_name(&call.name);
                    let content = format!("Error executing tool '{name}': not run, iteration cap reached");
                    agent
                        .memory_mut()
                        .append(Message::tool_result(call.id.clone(), name, content))?;
                }
                break;
            }
            rounds += 1;

            let calls: Vec<ToolCall> = reply.tool_calls.iter().map(ToolCall::from).collect();
            tool_calls += calls.len();
            debug!(iteration = rounds, calls = calls.len(), "ReAct: dispatching tools");

            for message in self.dispatcher.invoke_all(&calls).await {
                agent.memory_mut().append(message)?;
            }

            reply = self.request_completion(agent, &tools).await?;
        }

        if let Some(events) = &self.events {
            events.publish(DomainEvent::TurnCompleted {
                agent: agent.name().to_string(),
                rounds,
                tool_calls,
                cap_reached,
                timestamp: chrono::Utc::now(),
            });
        }

        Ok(TurnOutcome {
            answer: reply.text().to_string(),
            rounds,
            tool_calls,
            cap_reached,
        })
    }

    /// Send the whole memory, append the reply, and return it.
    async fn request_completion(&self, agent: &mut Agent, tools: &[ToolDefinition]) -> Result<Message> {
        let request = CompletionRequest::new(self.connection.model(), agent.memory().messages().to_vec())
            .with_tools(tools.to_vec())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let completion = self.client.complete(request).await?;

        if let Some(events) = &self.events {
            events.publish(DomainEvent::CompletionReceived {
                agent: agent.name().to_string(),
                model: completion.model.clone(),
                tool_calls: completion.message.tool_calls.len(),
                tokens_used: completion.usage.map(|u| u.total_tokens),
                timestamp: chrono::Utc::now(),
            });
        }

        agent.memory_mut().append(completion.message.clone())?;
        Ok(completion.message)
    }
}

#[async_trait]
impl AgentFlow for ReactFlow {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn guidelines(&self) -> &[String] {
        &self.guidelines
    }

    async fn execute(&self, agent: &mut Agent, inputs: &[String]) -> Result<String> {
        info!(
            agent = %agent.name(),
            model = %self.connection.model(),
            inputs = inputs.len(),
            max_iterations = self.max_iterations,
            "ReAct flow starting"
        );

        let mut answer = String::new();
        for input in inputs {
            let outcome = self.run_turn(agent, input).await?;
            info!(
                rounds = outcome.rounds,
                tool_calls = outcome.tool_calls,
                cap_reached = outcome.cap_reached,
                "ReAct turn completed"
            );
            answer = outcome.answer;
        }

        debug!("Conversation so far:\n{}", render_transcript(agent.memory().messages()));
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedClient, text_reply, tool_call, tool_reply};
    use agentflow_core::{Role, ToolRegistry};
    use serde_json::json;

    fn flow(client: Arc<ScriptedClient>) -> ReactFlow {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(agentflow_tools::echo::EchoTool));
        let connection = Connection::with_resolver("test", "http://localhost", "mock-model", "k", |_| None);
        ReactFlow::new("Single Agent ReAct", connection, client, ToolDispatcher::new(Arc::new(registry)))
    }

    fn agent(flow: Arc<ReactFlow>) -> Agent {
        Agent::builder("helper")
            .with_role(["You are a helper."])
            .with_tools(["echo"])
            .with_flow(flow)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn turn_without_tools_is_one_round_trip() {
        let client = Arc::new(ScriptedClient::new(vec![text_reply("4")]));
        let flow = Arc::new(flow(client.clone()));
        let mut agent = agent(flow.clone());

        let outcome = flow.run_turn(&mut agent, "What's 2+2?").await.unwrap();
        assert_eq!(
            outcome,
            TurnOutcome {
                answer: "4".into(),
                rounds: 0,
                tool_calls: 0,
                cap_reached: false
            }
        );
        assert_eq!(client.call_count(), 1);
        assert_eq!(agent.memory().len(), 3);
    }

    #[tokio::test]
    async fn sends_selected_tool_schemas_and_model() {
        let client = Arc::new(ScriptedClient::new(vec![text_reply("ok")]));
        let flow = Arc::new(flow(client.clone()));
        let mut agent = agent(flow.clone());
        flow.run_turn(&mut agent, "hi").await.unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.model, "mock-model");
        assert_eq!(request.tools.len(), 1);
        assert_eq!(request.tools[0].name, "echo");
        assert_eq!(request.messages.len(), 2);
    }

    #[tokio::test]
    async fn tool_results_feed_the_next_completion() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_reply(vec![tool_call("call_1", "echo", json!({"x": "hi"}))]),
            text_reply("The tool said hi."),
        ]));
        let flow = Arc::new(flow(client.clone()));
        let mut agent = agent(flow.clone());

        let outcome = flow.run_turn(&mut agent, "echo hi").await.unwrap();
        assert_eq!(outcome.answer, "The tool said hi.");
        assert_eq!(outcome.rounds, 1);

        let second = &client.requests()[1];
        let last = second.messages.last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert_eq!(last.text(), "hi");
        assert_eq!(last.tool_call_id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn cap_stops_the_loop() {
        let looping = tool_reply(vec![tool_call("c", "echo", json!({"x": "again"}))]);
        let client = Arc::new(ScriptedClient::repeating(looping));
        let flow = Arc::new(flow(client.clone()).with_max_iterations(2));
        let mut agent = agent(flow.clone());

        let outcome = flow.run_turn(&mut agent, "loop").await.unwrap();
        assert!(outcome.cap_reached);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(client.call_count(), 3);
        assert_eq!(outcome.answer, "");

        let last = agent.memory().last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert_eq!(last.tool_call_id.as_deref(), Some("c"));
        assert_eq!(last.text(), "Error executing tool 'echo': not run, iteration cap reached");
        assert_eq!(agent.memory().outstanding_tool_calls().count(), 0);
    }

    #[tokio::test]
    async fn zero_cap_never_dispatches() {
        let looping = tool_reply(vec![tool_call("c", "echo", json!({"x": "x"}))]);
        let client = Arc::new(ScriptedClient::repeating(looping));
        let flow = Arc::new(flow(client.clone()).with_max_iterations(0));
        let mut agent = agent(flow.clone());

        let outcome = flow.run_turn(&mut agent, "go").await.unwrap();
        assert!(outcome.cap_reached);
        assert_eq!(outcome.tool_calls, 0);
        assert_eq!(client.call_count(), 1);
        assert_eq!(agent.memory().outstanding_tool_calls().count(), 0);
    }

    #[tokio::test]
    async fn forwards_sampling_limits() {
        let client = Arc::new(ScriptedClient::new(vec![text_reply("ok")]));
        let flow = Arc::new(
            flow(client.clone())
                .with_temperature(Some(0.3))
                .with_max_tokens(Some(256)),
        );
        let mut agent = agent(flow.clone());
        flow.run_turn(&mut agent, "hi").await.unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(256));
    }

    #[tokio::test]
    async fn empty_inputs_make_no_calls() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let flow = Arc::new(flow(client.clone()));
        let mut agent = agent(flow.clone());
        let answer = agent.run_conversation(&[]).await.unwrap();
        assert_eq!(answer, "");
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn publishes_turn_events() {
        let events = Arc::new(EventBus::new(16));
        let mut rx = events.subscribe();
        let client = Arc::new(ScriptedClient::new(vec![text_reply("done")]));
        let flow = Arc::new(flow(client).with_events(events));
        let mut agent = agent(flow.clone());
        flow.run_turn(&mut agent, "hi").await.unwrap();

        assert!(matches!(
            rx.recv().await.unwrap().as_ref(),
            DomainEvent::CompletionReceived { tool_calls: 0, .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap().as_ref(),
            DomainEvent::TurnCompleted { rounds: 0, cap_reached: false, .. }
        ));
    }

    #[test]
    fn name_is_normalized() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        assert_eq!(flow(client).name(), "single_agent_react");
    }
}
