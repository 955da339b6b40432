//! Closure-backed tools, for registering capabilities without a dedicated type.

use agentflow_core::error::ToolError;
use agentflow_core::tool::{Parameter, Tool, ToolMetadata};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::sync::Arc;

type Handler = Arc<dyn Fn(Map<String, Value>) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync>;

/// A [`Tool`] whose behavior is a closure.
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: Vec<Parameter>,
    metadata: ToolMetadata,
    handler: Handler,
}

impl FunctionTool {
    /// An async tool.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<Parameter>,
        handler: F,
    ) -> Self
    where
        F: Fn(Map<String, Value>) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            metadata: ToolMetadata::default(),
            handler: Arc::new(handler),
        }
    }

    /// A synchronous tool; the closure runs when the dispatcher polls it.
    pub fn from_fn<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<Parameter>,
        handler: F,
    ) -> Self
    where
        F: Fn(Map<String, Value>) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        Self::new(name, description, parameters, move |args| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler(args) })
        })
    }

    pub fn with_metadata(mut self, metadata: ToolMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.parameters.clone()
    }

    fn metadata(&self) -> ToolMetadata {
        self.metadata.clone()
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        (self.handler)(arguments).await
    }
}
