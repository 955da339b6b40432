//! Tool trait — the abstraction over agent capabilities.
//!
//! A tool is a named capability the model can ask for: it declares typed
//! parameters (rendered as a JSON Schema for the model) and exposes a single
//! async `invoke` entry point. Synchronous tools simply return immediately.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::name::normalize_name;
use crate::provider::ToolDefinition;

/// The declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Integer => "integer",
            ParameterType::Boolean => "boolean",
            ParameterType::Object => "object",
            ParameterType::Array => "array",
        }
    }
}

/// A single named parameter a tool accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub description: String,
    /// Allowed values, if the parameter is an enumeration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl Parameter {
    /// A required parameter.
    pub fn new(name: impl Into<String>, kind: ParameterType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            allowed: None,
            required: true,
        }
    }

    /// Mark the parameter optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Restrict the parameter to an enumerated set of values.
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    fn property_schema(&self) -> Value {
        let mut prop = json!({
            "type": self.kind.as_str(),
            "description": self.description,
        });
        if let Some(values) = &self.allowed
            && !values.is_empty()
        {
            prop["enum"] = Value::Array(values.clone());
        }
        prop
    }
}

/// Build the JSON Schema object for a parameter list.
pub fn parameters_schema(parameters: &[Parameter]) -> Value {
    let properties: Map<String, Value> = parameters
        .iter()
        .map(|p| (p.name.clone(), p.property_schema()))
        .collect();
    let required: Vec<&str> = parameters
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Informational metadata about a tool. Never affects dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub category: String,
}

fn default_version() -> String {
    "1.0".into()
}

impl Default for ToolMetadata {
    fn default() -> Self {
        Self {
            author: String::new(),
            version: default_version(),
            category: String::new(),
        }
    }
}

/// The core Tool trait.
///
/// Tools are registered in a [`ToolRegistry`] and invoked by the dispatcher
/// when the model requests them.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool name as declared. The registry stores it normalized.
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// The parameters this tool accepts, in declaration order.
    fn parameters(&self) -> Vec<Parameter>;

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::default()
    }

    /// Run the tool with keyword arguments parsed from the model's request.
    ///
    /// Any JSON value may be returned; the dispatcher turns it into text.
    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> Value {
        parameters_schema(&self.parameters())
    }

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: normalize_name(self.name()),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Arguments of a tool call: already structured, or still JSON-encoded text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArguments {
    Encoded(String),
    Structured(Value),
}

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_call.id)
    pub id: String,

    /// Name of the tool to execute, as requested (normalized at dispatch)
    pub name: String,

    pub arguments: ToolArguments,
}

impl From<&MessageToolCall> for ToolCall {
    fn from(tc: &MessageToolCall) -> Self {
        Self {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments: ToolArguments::Encoded(tc.arguments.clone()),
        }
    }
}

/// A registry of available tools keyed by normalized name.
///
/// Built once at startup and shared read-only (typically behind an `Arc`).
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same normalized name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = normalize_name(tool.name());
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Tool re-registered, previous definition replaced");
        }
    }

    /// Look up a tool by name (normalized before lookup).
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(&normalize_name(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(&normalize_name(name))
    }

    /// Tool definitions for a subset of tools, in the order requested.
    ///
    /// Unknown names are skipped.
    pub fn schema_for<S: AsRef<str>>(&self, names: &[S]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| {
                let key = normalize_name(name.as_ref());
                match self.tools.get(&key) {
                    Some(tool) => Some(ToolDefinition {
                        name: key,
                        description: tool.description().to_string(),
                        parameters: tool.parameters_schema(),
                    }),
                    None => {
                        warn!(tool = %key, "Selected tool is not registered, leaving it out");
                        None
                    }
                }
            })
            .collect()
    }

    /// Definitions for every registered tool, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.schema_for(&self.names())
    }

    /// All registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool {
        name: &'static str,
        description: &'static str,
    }

    impl EchoTool {
        fn named(name: &'static str) -> Arc<dyn Tool> {
            Arc::new(Self {
                name,
                description: "Echoes back the input",
            })
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            self.description
        }
        fn parameters(&self) -> Vec<Parameter> {
            vec![
                Parameter::new("text", ParameterType::String, "Text to echo"),
                Parameter::new("style", ParameterType::String, "Output style")
                    .one_of(["plain", "shout"])
                    .optional(),
            ]
        }
        async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
            Ok(arguments.get("text").cloned().unwrap_or(Value::Null))
        }
    }

    #[test]
    fn registry_normalizes_names() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::named("Echo Text"));
        assert!(registry.get("echo_text").is_some());
        assert!(registry.get("ECHO TEXT").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::named("echo"));
        registry.register(Arc::new(EchoTool {
            name: "echo",
            description: "second",
        }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("echo").unwrap().description(), "second");
    }

    #[test]
    fn parameter_schema_shape() {
        let schema = EchoTool::named("echo").parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["text"]["type"], "string");
        assert_eq!(schema["properties"]["text"]["description"], "Text to echo");
        assert!(schema["properties"]["text"].get("enum").is_none());
        assert_eq!(schema["properties"]["style"]["enum"], json!(["plain", "shout"]));
        assert_eq!(schema["required"], json!(["text"]));
    }

    #[test]
    fn schema_for_follows_requested_order_and_skips_unknown() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::named("alpha"));
        registry.register(EchoTool::named("beta"));
        let defs = registry.schema_for(&["Beta", "missing", "alpha"]);
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "alpha"]);
    }

    #[test]
    fn definitions_are_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::named("zeta"));
        registry.register(EchoTool::named("alpha"));
        let defs = registry.definitions();
        assert_eq!(defs[0].name, "alpha");
        assert_eq!(defs[1].name, "zeta");
    }

    #[test]
    fn arguments_deserialize_untagged() {
        let encoded: ToolArguments = serde_json::from_value(json!(r#"{"x":1}"#)).unwrap();
        assert!(matches!(encoded, ToolArguments::Encoded(_)));
        let structured: ToolArguments = serde_json::from_value(json!({"x": 1})).unwrap();
        assert!(matches!(structured, ToolArguments::Structured(_)));
    }

    #[test]
    fn tool_call_from_message_tool_call() {
        let call = ToolCall::from(&MessageToolCall::new("call_1", "Echo", r#"{"text":"hi"}"#));
        assert_eq!(call.id, "call_1");
        assert_eq!(call.arguments, ToolArguments::Encoded(r#"{"text":"hi"}"#.into()));
    }

    #[tokio::test]
    async fn invoke_returns_value() {
        let tool = EchoTool::named("echo");
        let mut args = Map::new();
        args.insert("text".into(), json!("hello world"));
        assert_eq!(tool.invoke(args).await.unwrap(), json!("hello world"));
    }
}
