//! Configuration loading, validation, and management for AgentFlow.
//!
//! Loads configuration from `~/.agentflow/config.toml` (or the path in
//! `AGENTFLOW_CONFIG`) with environment variable overrides. Validates all
//! cross-references (agent → flow → connection) at startup so a bad file
//! fails before any model is called.

use agentflow_core::{AgentProfile, Connection, normalize_name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.agentflow/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Agent used when none is named on the command line
    #[serde(default = "default_agent")]
    pub default_agent: String,

    /// Sampling temperature sent with every completion (provider default if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Cap on tokens generated per completion (provider default if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Completion retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Tool dispatch settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Named model connections
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,

    /// Named agent flows
    #[serde(default)]
    pub flows: BTreeMap<String, FlowConfig>,

    /// Named agents
    #[serde(default)]
    pub agents: BTreeMap<String, AgentConfig>,
}

fn default_agent() -> String {
    "assistant".into()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub base_url: String,

    pub model: String,

    /// A literal key, or the name of an environment variable holding it
    pub api_key: String,
}

impl ConnectionConfig {
    /// Resolve into a [`Connection`], reading the credential from the environment if named.
    pub fn to_connection(&self, name: &str) -> Connection {
        Connection::new(name, &self.base_url, &self.model, &self.api_key)
    }

    /// The credential as safe to display: `$NAME` for an env var, otherwise `[REDACTED]`.
    pub fn redacted_api_key(&self) -> String {
        redact(&self.api_key)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.redacted_api_key())
            .finish()
    }
}

/// Environment variable names are safe to show; literal secrets are not.
fn redact(credential: &str) -> String {
    if !credential.is_empty()
        && credential
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        format!("${credential}")
    } else {
        "[REDACTED]".into()
    }
}

/// Which conversation strategy a flow runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Reason + act loop with tool calling
    React,
    /// Canned greeting, no model call
    Greeting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub kind: FlowKind,

    #[serde(default)]
    pub description: String,

    /// Connection this flow talks to (required for `react`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,

    /// Guideline lines injected into every agent's preamble
    #[serde(default)]
    pub guidelines: Vec<String>,

    /// Maximum tool rounds per user input
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Informational only (author, version, category, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

fn default_max_iterations() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Display name; the table key as written when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Name of the flow this agent runs
    pub flow: String,

    #[serde(default)]
    pub role: Vec<String>,

    #[serde(default)]
    pub guidelines: Vec<String>,

    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentConfig {
    /// The persona this configuration describes. `key` names it when no display name is set.
    pub fn profile(&self, key: &str) -> AgentProfile {
        AgentProfile::new(self.name.as_deref().unwrap_or(key))
            .with_role(self.role.iter().cloned())
            .with_guidelines(self.guidelines.iter().cloned())
            .with_tools(self.tools.iter().cloned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per completion, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff multiplier: the n-th retry waits up to `multiplier_ms * 2^(n-1)`
    #[serde(default = "default_multiplier_ms")]
    pub multiplier_ms: u64,

    /// Upper bound on any single backoff delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_multiplier_ms() -> u64 {
    1_000
}
fn default_max_delay_ms() -> u64 {
    40_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            multiplier_ms: default_multiplier_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Per-call timeout; 0 disables it
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_tool_timeout() -> u64 {
    60
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `AGENTFLOW_CONFIG` or the default path.
    ///
    /// `AGENTFLOW_MODEL` overrides the model of every connection.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("AGENTFLOW_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_path());
        let mut config = Self::load_from(&path)?;

        if let Ok(model) = std::env::var("AGENTFLOW_MODEL") {
            tracing::debug!(%model, "Model overridden from environment");
            for connection in config.connections.values_mut() {
                connection.model = model.clone();
            }
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.normalize_keys();
        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentflow")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    fn normalize_keys(&mut self) {
        self.default_agent = normalize_name(&self.default_agent);
        self.connections = std::mem::take(&mut self.connections)
            .into_iter()
            .map(|(k, v)| (normalize_name(&k), v))
            .collect();
        self.flows = std::mem::take(&mut self.flows)
            .into_iter()
            .map(|(k, mut v)| {
                v.connection = v.connection.map(|c| normalize_name(&c));
                (normalize_name(&k), v)
            })
            .collect();
        self.agents = std::mem::take(&mut self.agents)
            .into_iter()
            .map(|(k, mut v)| {
                v.flow = normalize_name(&v.flow);
                let key = normalize_name(&k);
                if v.name.is_none() {
                    v.name = Some(k);
                }
                (key, v)
            })
            .collect();
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_tokens == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_tokens must be at least 1".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        for (name, flow) in &self.flows {
            match (&flow.kind, &flow.connection) {
                (FlowKind::React, None) => {
                    return Err(ConfigError::ValidationError(format!(
                        "flow '{name}' is a react flow but names no connection"
                    )));
                }
                (_, Some(conn)) if !self.connections.contains_key(conn) => {
                    return Err(ConfigError::ValidationError(format!(
                        "Model connection '{conn}' not found in registered connections (flow '{name}')"
                    )));
                }
                _ => {}
            }
        }

        for (name, agent) in &self.agents {
            if !self.flows.contains_key(&agent.flow) {
                return Err(ConfigError::ValidationError(format!(
                    "Agent flow '{}' not found in registered agent flows (agent '{name}')",
                    agent.flow
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut connections = BTreeMap::new();
        connections.insert(
            "openai_gpt4o".to_string(),
            ConnectionConfig {
                base_url: "https://api.openai.com/v1".into(),
                model: "gpt-4o".into(),
                api_key: "OPENAI_API_KEY".into(),
            },
        );

        let mut flows = BTreeMap::new();
        flows.insert(
            "single_agent_react".to_string(),
            FlowConfig {
                kind: FlowKind::React,
                description: "Reason + act: think, call tools, observe, repeat until done.".into(),
                connection: Some("openai_gpt4o".into()),
                guidelines: vec![concat!(
                    "Work in a reason-and-act loop: think about the request, call tools when ",
                    "you need information or input, read their results, and repeat until you ",
                    "can answer. Do not guess tool arguments unless the conversation already ",
                    "makes the value clear."
                )
                .into()],
                max_iterations: default_max_iterations(),
                metadata: BTreeMap::new(),
            },
        );
        flows.insert(
            "greeting".to_string(),
            FlowConfig {
                kind: FlowKind::Greeting,
                description: "Replies with a greeting without calling a model.".into(),
                connection: None,
                guidelines: vec![],
                max_iterations: default_max_iterations(),
                metadata: BTreeMap::new(),
            },
        );

        let mut agents = BTreeMap::new();
        agents.insert(
            default_agent(),
            AgentConfig {
                name: None,
                flow: "single_agent_react".into(),
                role: vec!["You are a helpful assistant.".into()],
                guidelines: vec!["Ask the user for clarification when a request is ambiguous.".into()],
                tools: vec!["get_user_input".into(), "get_current_time".into()],
            },
        );

        Self {
            default_agent: default_agent(),
            temperature: None,
            max_tokens: None,
            retry: RetryConfig::default(),
            tools: ToolsConfig::default(),
            connections,
            flows,
            agents,
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for agentflow_core::Error {
    fn from(e: ConfigError) -> Self {
        agentflow_core::Error::config(e.to_string())
    }
}
