//! Tool dispatch and built-in tools for AgentFlow.
//!
//! The [`ToolDispatcher`] executes a batch of model-issued tool calls
//! concurrently and turns every outcome, including failures, into a tool
//! message. The built-ins cover the basics: echoing a value, asking the user
//! a question, and reading the clock. Anything else can be registered as a
//! [`FunctionTool`] or a custom `Tool` implementation.

pub mod current_time;
pub mod dispatcher;
pub mod echo;
pub mod function_tool;
pub mod user_input;

use agentflow_core::tool::ToolRegistry;
use std::sync::Arc;

pub use dispatcher::ToolDispatcher;
pub use function_tool::FunctionTool;
pub use user_input::Console;

/// Create a tool registry holding every built-in tool.
pub fn default_registry() -> ToolRegistry {
    registry_with_console(Arc::new(Console::stdio()))
}

/// Built-in tools, with `get_user_input` talking through `console`.
pub fn registry_with_console(console: Arc<Console>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(echo::EchoTool));
    registry.register(Arc::new(user_input::UserInputTool::with_console(console)));
    registry.register(Arc::new(current_time::CurrentTimeTool));
    registry
}
