//! Connection registry: normalized name → connection + completion client.
//!
//! Built once at startup from configuration and shared read-only.

use agentflow_core::provider::CompletionClient;
use agentflow_core::{Connection, normalize_name};
use std::collections::HashMap;
use std::sync::Arc;

use crate::openai_compat::OpenAiCompatClient;
use crate::retry::{RetryPolicy, RetryingClient};

/// A registered connection and the client that talks to it.
#[derive(Clone)]
pub struct ConnectionEntry {
    pub connection: Connection,
    pub client: Arc<dyn CompletionClient>,
}

#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    entries: HashMap<String, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under its (already normalized) name.
    pub fn register(&mut self, connection: Connection, client: Arc<dyn CompletionClient>) {
        let name = connection.name().to_string();
        if self.entries.contains_key(&name) {
            tracing::warn!(connection = %name, "Replacing registered connection");
        }
        self.entries.insert(name, ConnectionEntry { connection, client });
    }

    pub fn get(&self, name: &str) -> Option<&ConnectionEntry> {
        self.entries.get(&normalize_name(name))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build every configured connection, each behind a retrying OpenAI-compatible client.
pub fn build_from_config(
    config: &agentflow_config::AppConfig,
) -> agentflow_core::Result<ConnectionRegistry> {
    let policy = RetryPolicy::from(&config.retry);
    let mut registry = ConnectionRegistry::new();

    for (name, conn_config) in &config.connections {
        let connection = conn_config.to_connection(name);
        let http = OpenAiCompatClient::from_connection(&connection).map_err(|e| {
            agentflow_core::Error::config(format!("Cannot build client for connection '{name}': {e}"))
        })?;
        let client: Arc<dyn CompletionClient> = Arc::new(RetryingClient::new(Arc::new(http), policy));

        tracing::debug!(
            connection = %connection.name(),
            base_url = %connection.base_url(),
            model = %connection.model(),
            "Registered connection"
        );
        registry.register(connection, client);
    }

    Ok(registry)
}
