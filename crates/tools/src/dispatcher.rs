//! Tool dispatcher: turns a batch of model-issued tool calls into tool messages.
//!
//! Every failure mode (unknown tool, bad JSON, wrong argument shape, tool
//! error, panic, timeout) becomes the text of a tool message so the model can
//! see it and recover. Nothing here returns an error to the caller.

use agentflow_core::error::ToolError;
use agentflow_core::event::{DomainEvent, EventBus};
use agentflow_core::tool::{ToolArguments, ToolCall, ToolRegistry};
use agentflow_core::{Message, normalize_name};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Executes tool calls against a shared [`ToolRegistry`].
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    timeout: Option<Duration>,
    events: Option<Arc<EventBus>>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: None,
            events: None,
        }
    }

    /// Bound each call. `None` lets tools run as long as they like.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run every call concurrently and return one tool message per call, in request order.
    pub async fn invoke_all(&self, calls: &[ToolCall]) -> Vec<Message> {
        let futures: Vec<_> = calls.iter().map(|call| self.invoke(call)).collect();
        futures::future::join_all(futures).await
    }

    /// Run a single call.
    pub async fn invoke(&self, call: &ToolCall) -> Message {
        let name = normalize_name(&call.name);
        let started = Instant::now();
        let (content, success) = self.run(&name, call).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        if success {
            debug!(tool = %name, call_id = %call.id, duration_ms, "Tool executed");
        } else {
            warn!(tool = %name, call_id = %call.id, duration_ms, error = %content, "Tool call failed");
        }

        if let Some(events) = &self.events {
            events.publish(DomainEvent::ToolExecuted {
                tool_name: name.clone(),
                call_id: call.id.clone(),
                success,
                duration_ms,
                timestamp: chrono::Utc::now(),
            });
        }

        Message::tool_result(call.id.clone(), name, content)
    }

    async fn run(&self, name: &str, call: &ToolCall) -> (String, bool) {
        let Some(tool) = self.registry.get(name) else {
            return (ToolError::NotFound(name.to_string()).to_string(), false);
        };

        let arguments = match parse_arguments(name, &call.arguments) {
            Ok(arguments) => arguments,
            Err(message) => return (message, false),
        };

        let invocation = AssertUnwindSafe(tool.invoke(arguments)).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, invocation).await {
                Ok(outcome) => outcome,
                Err(_) => Ok(Err(ToolError::Timeout {
                    timeout_secs: limit.as_secs(),
                })),
            },
            None => invocation.await,
        };

        match outcome {
            Ok(Ok(value)) => (render_value(value), true),
            Ok(Err(e)) => (format!("Error executing tool '{name}': {e}"), false),
            Err(panic) => {
                let e = ToolError::Panicked(panic_message(panic.as_ref()));
                (format!("Error executing tool '{name}': {e}"), false)
            }
        }
    }
}

/// Decode the model's arguments into a keyword map, or the in-band error text.
fn parse_arguments(name: &str, arguments: &ToolArguments) -> Result<Map<String, Value>, String> {
    let value = match arguments {
        ToolArguments::Encoded(raw) if raw.trim().is_empty() => Value::Object(Map::new()),
        ToolArguments::Encoded(raw) => serde_json::from_str(raw)
            .map_err(|_| format!("Invalid JSON format for tool '{name}': {raw}"))?,
        ToolArguments::Structured(value) => value.clone(),
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!(
            "Invalid arguments type for tool '{name}'. Expected object, got {}",
            json_kind(&other)
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Structured results become compact JSON; strings pass through unquoted.
pub fn render_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function_tool::FunctionTool;
    use agentflow_core::tool::{Parameter, ParameterType};
    use agentflow_core::Role;
    use serde_json::json;

    fn call(id: &str, name: &str, args: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: ToolArguments::Encoded(args.into()),
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(crate::echo::EchoTool));
        registry.register(Arc::new(FunctionTool::from_fn(
            "Explode",
            "Always fails",
            vec![],
            |_| Err(ToolError::Failed("boom".into())),
        )));
        registry.register(Arc::new(FunctionTool::from_fn(
            "panicky",
            "Panics",
            vec![],
            |_| panic!("tool bug"),
        )));
        registry.register(Arc::new(FunctionTool::new(
            "sleepy",
            "Sleeps for `ms` then returns it",
            vec![Parameter::new("ms", ParameterType::Integer, "Milliseconds")],
            |args| {
                Box::pin(async move {
                    let ms = args.get("ms").and_then(Value::as_u64).unwrap_or(0);
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(json!(ms))
                })
            },
        )));
        registry.register(Arc::new(FunctionTool::from_fn(
            "lookup",
            "Returns a record",
            vec![],
            |_| Ok(json!({"city": "Paris", "temps": [1, 2]})),
        )));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn echo_returns_raw_string() {
        let dispatcher = ToolDispatcher::new(registry());
        let msgs = dispatcher.invoke_all(&[call("c1", "echo", r#"{"x":"hi"}"#)]).await;
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, Role::Tool);
        assert_eq!(msgs[0].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(msgs[0].name.as_deref(), Some("echo"));
        assert_eq!(msgs[0].text(), "hi");
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_in_band() {
        let dispatcher = ToolDispatcher::new(registry());
        let msgs = dispatcher.invoke_all(&[call("c1", "nope", "{}")]).await;
        assert_eq!(msgs[0].text(), "Tool 'nope' not found.");
    }

    #[tokio::test]
    async fn malformed_json_is_reported_in_band() {
        let dispatcher = ToolDispatcher::new(registry());
        let msgs = dispatcher.invoke_all(&[call("c1", "echo", "{bad")]).await;
        assert_eq!(msgs[0].text(), "Invalid JSON format for tool 'echo': {bad");
    }

    #[tokio::test]
    async fn non_object_arguments_are_reported_in_band() {
        let dispatcher = ToolDispatcher::new(registry());
        let msgs = dispatcher.invoke_all(&[call("c1", "echo", "[1,2]")]).await;
        assert_eq!(
            msgs[0].text(),
            "Invalid arguments type for tool 'echo'. Expected object, got array"
        );
    }

    #[tokio::test]
    async fn blank_arguments_mean_no_arguments() {
        let dispatcher = ToolDispatcher::new(registry());
        let msgs = dispatcher.invoke_all(&[call("c1", "lookup", "  ")]).await;
        assert_eq!(msgs[0].text(), r#"{"city":"Paris","temps":[1,2]}"#);
    }

    #[tokio::test]
    async fn structured_arguments_are_accepted() {
        let dispatcher = ToolDispatcher::new(registry());
        let msgs = dispatcher
            .invoke_all(&[ToolCall {
                id: "c1".into(),
                name: "echo".into(),
                arguments: ToolArguments::Structured(json!({"x": 42})),
            }])
            .await;
        assert_eq!(msgs[0].text(), "42");
    }

    #[tokio::test]
    async fn tool_error_is_reported_in_band() {
        let dispatcher = ToolDispatcher::new(registry());
        let msgs = dispatcher.invoke_all(&[call("c1", "explode", "{}")]).await;
        assert_eq!(msgs[0].text(), "Error executing tool 'explode': boom");
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let dispatcher = ToolDispatcher::new(registry());
        let msgs = dispatcher
            .invoke_all(&[call("c1", "panicky", "{}"), call("c2", "echo", r#"{"x":"still here"}"#)])
            .await;
        assert_eq!(msgs[0].text(), "Error executing tool 'panicky': panicked: tool bug");
        assert_eq!(msgs[1].text(), "still here");
    }

    #[tokio::test]
    async fn requested_name_is_normalized() {
        let dispatcher = ToolDispatcher::new(registry());
        let msgs = dispatcher.invoke_all(&[call("c1", "Explode", "{}")]).await;
        assert_eq!(msgs[0].name.as_deref(), Some("explode"));
    }

    #[tokio::test(start_paused = true)]
    async fn order_preserved_when_completion_order_differs() {
        let dispatcher = ToolDispatcher::new(registry());
        let msgs = dispatcher
            .invoke_all(&[
                call("slow", "sleepy", r#"{"ms":300}"#),
                call("fast", "sleepy", r#"{"ms":10}"#),
                call("mid", "sleepy", r#"{"ms":100}"#),
            ])
            .await;
        let ids: Vec<_> = msgs.iter().map(|m| m.tool_call_id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["slow", "fast", "mid"]);
        assert_eq!(msgs[0].text(), "300");
    }

    #[tokio::test(start_paused = true)]
    async fn calls_run_concurrently() {
        let dispatcher = ToolDispatcher::new(registry());
        let start = tokio::time::Instant::now();
        dispatcher
            .invoke_all(&[
                call("a", "sleepy", r#"{"ms":200}"#),
                call("b", "sleepy", r#"{"ms":200}"#),
            ])
            .await;
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_only_affects_the_slow_call() {
        let dispatcher = ToolDispatcher::new(registry()).with_timeout(Some(Duration::from_secs(1)));
        let msgs = dispatcher
            .invoke_all(&[
                call("a", "sleepy", r#"{"ms":5000}"#),
                call("b", "sleepy", r#"{"ms":10}"#),
            ])
            .await;
        assert_eq!(msgs[0].text(), "Error executing tool 'sleepy': timed out after 1s");
        assert_eq!(msgs[1].text(), "10");
    }

    #[tokio::test]
    async fn publishes_tool_executed_events() {
        let events = Arc::new(EventBus::new(16));
        let mut rx = events.subscribe();
        let dispatcher = ToolDispatcher::new(registry()).with_events(events);

        dispatcher.invoke_all(&[call("c1", "nope", "{}")]).await;

        match rx.recv().await.unwrap().as_ref() {
            DomainEvent::ToolExecuted {
                tool_name, call_id, success, ..
            } => {
                assert_eq!(tool_name, "nope");
                assert_eq!(call_id, "c1");
                assert!(!success);
            }
            other => panic!("Expected ToolExecuted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_batch_yields_nothing() {
        let dispatcher = ToolDispatcher::new(registry());
        assert!(dispatcher.invoke_all(&[]).await.is_empty());
    }

    #[test]
    fn render_value_variants() {
        assert_eq!(render_value(json!("plain")), "plain");
        assert_eq!(render_value(json!(4)), "4");
        assert_eq!(render_value(json!(true)), "true");
        assert_eq!(render_value(json!(null)), "null");
        assert_eq!(render_value(json!([1, "a"])), r#"[1,"a"]"#);
    }
}
