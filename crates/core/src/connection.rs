//! Connection — the endpoint + model + credential triple used to reach a model.

/// A resolved connection to a chat-completion endpoint.
///
/// Immutable once built. The credential is resolved exactly once, at
/// construction: a value naming a set environment variable is replaced by
/// that variable's value, anything else is used literally.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    name: String,
    base_url: String,
    model: String,
    api_key: String,
}

impl Connection {
    /// Build a connection, resolving the credential from the process environment.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self::with_resolver(name, base_url, model, credential, |key| std::env::var(key).ok())
    }

    /// Build a connection with a custom credential lookup.
    pub fn with_resolver<F>(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        credential: impl Into<String>,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = credential.into();
        let api_key = resolve_credential(&credential, lookup);
        Self {
            name: crate::name::normalize_name(&name.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

fn resolve_credential<F>(credential: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if looks_like_env_name(credential)
        && let Some(value) = lookup(credential)
    {
        return value;
    }
    credential.to_string()
}

/// `OPENAI_API_KEY`-style names: non-empty, ASCII upper-case, digits and underscores.
fn looks_like_env_name(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(key: &str) -> Option<String> {
        (key == "TEST_PROVIDER_KEY").then(|| "sk-from-env".to_string())
    }

    #[test]
    fn placeholder_is_swapped_for_environment_value() {
        let conn = Connection::with_resolver("OpenAI", "https://api.openai.com/v1/", "gpt-4o", "TEST_PROVIDER_KEY", env);
        assert_eq!(conn.api_key(), "sk-from-env");
    }

    #[test]
    fn unset_placeholder_is_used_literally() {
        let conn = Connection::with_resolver("openai", "https://x", "gpt-4o", "UNSET_KEY_NAME", env);
        assert_eq!(conn.api_key(), "UNSET_KEY_NAME");
    }

    #[test]
    fn literal_secret_is_kept() {
        let conn = Connection::with_resolver("openai", "https://x", "gpt-4o", "sk-literal-123", env);
        assert_eq!(conn.api_key(), "sk-literal-123");
    }

    #[test]
    fn name_is_normalized_and_url_trimmed() {
        let conn = Connection::with_resolver("OpenAI GPT4o", "https://api.openai.com/v1/", "gpt-4o", "k", env);
        assert_eq!(conn.name(), "openai_gpt4o");
        assert_eq!(conn.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn debug_redacts_credential() {
        let conn = Connection::with_resolver("openai", "https://x", "gpt-4o", "sk-secret", env);
        let debug = format!("{conn:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
