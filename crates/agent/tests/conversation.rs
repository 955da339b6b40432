//! End-to-end conversations through the ReAct flow with scripted model replies.

use agentflow_agent::testing::{ScriptedClient, text_reply, tool_call, tool_reply};
use agentflow_agent::{Agent, FlowRegistry, GreetingFlow, ReactFlow};
use agentflow_core::error::{Error, ProviderError, ToolError};
use agentflow_core::{Connection, Role, ToolRegistry};
use agentflow_tools::{FunctionTool, ToolDispatcher};
use agentflow_core::tool::{Parameter, ParameterType};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

fn tools() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(agentflow_tools::echo::EchoTool));
    registry.register(Arc::new(FunctionTool::new(
        "wait",
        "Sleep for `ms` milliseconds, then return the label",
        vec![
            Parameter::new("ms", ParameterType::Integer, "Milliseconds"),
            Parameter::new("label", ParameterType::String, "Returned value"),
        ],
        |args| {
            Box::pin(async move {
                let ms = args.get("ms").and_then(Value::as_u64).unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(args.get("label").cloned().unwrap_or(Value::Null))
            })
        },
    )));
    registry.register(Arc::new(FunctionTool::from_fn(
        "fail",
        "Always fails",
        vec![],
        |_| Err(ToolError::Failed("disk full".into())),
    )));
    Arc::new(registry)
}

fn react(client: Arc<ScriptedClient>, max_iterations: u32) -> Arc<ReactFlow> {
    let connection = Connection::with_resolver("mock", "http://localhost", "mock-model", "k", |_| None);
    Arc::new(
        ReactFlow::new("single_agent_react", connection, client, ToolDispatcher::new(tools()))
            .with_guidelines(vec!["Reason, act, observe.".into()])
            .with_max_iterations(max_iterations),
    )
}

fn agent(flow: Arc<ReactFlow>) -> Agent {
    Agent::builder("helper")
        .with_role(["You are a helper."])
        .with_guidelines(["Answer briefly."])
        .with_tools(["echo", "wait", "fail"])
        .with_flow(flow)
        .build()
        .unwrap()
}

fn inputs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn plain_answer_adds_exactly_two_messages() {
    let client = Arc::new(ScriptedClient::new(vec![text_reply("4")]));
    let mut agent = agent(react(client.clone(), 5));
    let preamble = agent.memory().len();

    let answer = agent.run_conversation(&inputs(&["What's 2+2?"])).await.unwrap();

    assert_eq!(answer, "4");
    assert_eq!(agent.memory().len(), preamble + 2);
    let roles: Vec<Role> = agent.memory().messages()[preamble..].iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn echo_round_trip() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_reply(vec![tool_call("call_1", "echo", json!({"x": "hi"}))]),
        text_reply("You said hi."),
    ]));
    let mut agent = agent(react(client.clone(), 5));

    let answer = agent.run_conversation(&inputs(&["Echo hi"])).await.unwrap();
    assert_eq!(answer, "You said hi.");

    let tool_msg = agent
        .memory()
        .messages()
        .iter()
        .find(|m| m.role == Role::Tool)
        .unwrap();
    assert_eq!(tool_msg.text(), "hi");
    assert_eq!(tool_msg.name.as_deref(), Some("echo"));
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(client.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn tool_messages_follow_request_order() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_reply(vec![
            tool_call("a", "wait", json!({"ms": 300, "label": "first"})),
            tool_call("b", "wait", json!({"ms": 5, "label": "second"})),
            tool_call("c", "wait", json!({"ms": 50, "label": "third"})),
        ]),
        text_reply("done"),
    ]));
    let mut agent = agent(react(client.clone(), 5));
    agent.run_conversation(&inputs(&["go"])).await.unwrap();

    let tool_msgs: Vec<(&str, &str)> = agent
        .memory()
        .messages()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| (m.tool_call_id.as_deref().unwrap(), m.text()))
        .collect();
    assert_eq!(tool_msgs, vec![("a", "first"), ("b", "second"), ("c", "third")]);
}

#[tokio::test]
async fn failures_are_shown_to_the_model() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_reply(vec![
            tool_call("u", "no_such_tool", json!({})),
            tool_call("f", "fail", json!({})),
            tool_call("m", "echo", json!({})),
        ]),
        text_reply("recovered"),
    ]));
    let mut agent = agent(react(client.clone(), 5));
    let answer = agent.run_conversation(&inputs(&["try things"])).await.unwrap();
    assert_eq!(answer, "recovered");

    let second_request = &client.requests()[1];
    let tool_texts: Vec<&str> = second_request
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.text())
        .collect();
    assert_eq!(
        tool_texts,
        vec![
            "Tool 'no_such_tool' not found.",
            "Error executing tool 'fail': disk full",
            "Error executing tool 'echo': invalid arguments: missing 'x'",
        ]
    );
}

#[tokio::test]
async fn cap_of_two_means_at_most_three_completions() {
    let looping = tool_reply(vec![tool_call("loop", "echo", json!({"x": "again"}))]);
    let client = Arc::new(ScriptedClient::repeating(looping));
    let mut agent = agent(react(client.clone(), 2));

    let answer = agent.run_conversation(&inputs(&["never stop"])).await.unwrap();
    assert_eq!(answer, "");
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn capped_turn_leaves_no_unanswered_calls_for_the_next_input() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_reply(vec![tool_call("c1", "echo", json!({"x": "a"}))]),
        tool_reply(vec![tool_call("c2", "echo", json!({"x": "b"}))]),
        text_reply("second answer"),
    ]));
    let mut agent = agent(react(client.clone(), 1));
    let preamble = agent.memory().len();

    let answer = agent.run_conversation(&inputs(&["one", "two"])).await.unwrap();
    assert_eq!(answer, "second answer");
    assert_eq!(client.call_count(), 3);

    let third = &client.requests()[2];
    let roles: Vec<Role> = third.messages[preamble..].iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant, Role::Tool, Role::User]
    );

    let requested: Vec<&str> = third
        .messages
        .iter()
        .flat_map(|m| m.tool_calls.iter().map(|c| c.id.as_str()))
        .collect();
    let answered: Vec<&str> = third
        .messages
        .iter()
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    assert_eq!(requested, answered);
    assert_eq!(
        third.messages[preamble + 4].text(),
        "Error executing tool 'echo': not run, iteration cap reached"
    );
}

#[tokio::test]
async fn every_input_is_processed_and_last_answer_returned() {
    let client = Arc::new(ScriptedClient::new(vec![text_reply("first"), text_reply("second")]));
    let mut agent = agent(react(client.clone(), 5));
    let preamble = agent.memory().len();

    let answer = agent.run_conversation(&inputs(&["one", "two"])).await.unwrap();
    assert_eq!(answer, "second");
    assert_eq!(agent.memory().len(), preamble + 4);
    // The second request carries the whole first exchange
    assert_eq!(client.requests()[1].messages.len(), preamble + 3);
}

#[tokio::test]
async fn completion_failure_is_fatal_for_the_turn() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let mut agent = agent(react(client, 5));
    let err = agent.run_conversation(&inputs(&["hello"])).await.unwrap_err();
    assert!(matches!(err, Error::Provider(ProviderError::InvalidResponse(_))));
}

#[tokio::test]
async fn reset_restores_the_preamble() {
    let client = Arc::new(ScriptedClient::new(vec![text_reply("hi"), text_reply("hi again")]));
    let mut agent = agent(react(client, 5));
    let fresh: Vec<String> = agent.memory().messages().iter().map(|m| m.text().to_string()).collect();
    assert_eq!(fresh, vec!["You are a helper.", "Reason, act, observe.", "Answer briefly."]);

    agent.run_conversation(&inputs(&["hello"])).await.unwrap();
    agent.reset();
    agent.reset();
    let after: Vec<String> = agent.memory().messages().iter().map(|m| m.text().to_string()).collect();
    assert_eq!(after, fresh);

    // Still usable after a reset
    assert_eq!(agent.run_conversation(&inputs(&["again"])).await.unwrap(), "hi again");
}

#[tokio::test]
async fn flows_are_pluggable_through_the_registry() {
    let client = Arc::new(ScriptedClient::new(vec![text_reply("from the model")]));
    let mut flows = FlowRegistry::new();
    flows.register(react(client, 5));
    flows.register(Arc::new(GreetingFlow::new("greeting")));

    let profile = agent(react(Arc::new(ScriptedClient::new(vec![])), 5)).profile().clone();

    let mut greeter = Agent::from_profile(profile.clone(), &flows, "greeting").unwrap();
    let mut reasoner = Agent::from_profile(profile, &flows, "Single Agent ReAct").unwrap();

    assert_eq!(
        greeter.run_conversation(&inputs(&["hi"])).await.unwrap(),
        "Hello! I am helper, your AI assistant.\nI see your question: hi"
    );
    assert_eq!(
        reasoner.run_conversation(&inputs(&["hi"])).await.unwrap(),
        "from the model"
    );
}
