//! Error types for the AgentFlow domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Only two classes of failure are fatal to a conversation: configuration
//! errors (raised while wiring agents together) and completion transport
//! errors that survived every retry. Tool failures are reported in-band as
//! tool messages and never surface here at the flow level.

use thiserror::Error;

/// The top-level error type for all AgentFlow operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Shorthand for building a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Completion failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<ProviderError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("Tool response '{tool_call_id}' does not answer an outstanding tool call (expected {expected})")]
    UnexpectedToolResponse {
        tool_call_id: String,
        expected: String,
    },

    #[error("Tool message is missing its tool_call_id")]
    MissingToolCallId,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool '{0}' not found.")]
    NotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),

    #[error("timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("panicked: {0}")]
    Panicked(String),
}
