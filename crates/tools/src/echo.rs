//! Echo tool: returns its `x` argument unchanged. Handy for wiring checks.

use agentflow_core::error::ToolError;
use agentflow_core::tool::{Parameter, ParameterType, Tool, ToolMetadata};
use async_trait::async_trait;
use serde_json::{Map, Value};

pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Return the value of `x` unchanged."
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::new("x", ParameterType::String, "The value to echo back.")]
    }

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            category: "Debug".into(),
            ..ToolMetadata::default()
        }
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        arguments
            .get("x")
            .cloned()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'x'".into()))
    }
}
