//! # AgentFlow Core
//!
//! Domain types, traits, and error definitions for the AgentFlow agent runtime.
//! This crate has **no runtime dependencies** beyond serialization and async
//! plumbing; it defines the domain model every other crate implements against.
//!
//! ## Layout
//!
//! - [`message`] and [`memory`]: the conversation log an agent owns
//! - [`tool`]: the tool capability, its parameter schema, and the registry
//! - [`provider`]: the chat-completion client contract
//! - [`connection`]: endpoint + model + credential triples
//! - [`agent`]: the persona an agent is built from
//! - [`event`]: domain events published while a flow runs

pub mod agent;
pub mod connection;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod name;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::AgentProfile;
pub use connection::Connection;
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use memory::Memory;
pub use message::{Message, MessageToolCall, Role};
pub use name::normalize_name;
pub use provider::{Completion, CompletionClient, CompletionRequest, ToolDefinition};
pub use tool::{Parameter, ParameterType, Tool, ToolArguments, ToolCall, ToolMetadata, ToolRegistry};
