//! Current time tool — reports the local date and time.

use agentflow_core::error::ToolError;
use agentflow_core::tool::{Parameter, ParameterType, Tool, ToolMetadata};
use async_trait::async_trait;
use chrono::{Local, Utc};
use serde_json::{Map, Value, json};

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time, in local time or UTC."
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::new("timezone", ParameterType::String, "Which clock to read.")
                .one_of(["local", "utc"])
                .optional(),
        ]
    }

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            category: "Utility".into(),
            ..ToolMetadata::default()
        }
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let zone = arguments.get("timezone").and_then(Value::as_str).unwrap_or("local");
        let (timestamp, weekday) = match zone {
            "local" => {
                let now = Local::now();
                (now.to_rfc3339(), now.format("%A").to_string())
            }
            "utc" => {
                let now = Utc::now();
                (now.to_rfc3339(), now.format("%A").to_string())
            }
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "timezone must be 'local' or 'utc', got '{other}'"
                )));
            }
        };
        Ok(json!({ "timezone": zone, "timestamp": timestamp, "weekday": weekday }))
    }
}
