//! Registry key normalization.

/// Normalize a registry key: lower-case, spaces replaced by underscores.
///
/// Tools, flows, agents and connections are all looked up by this form,
/// so "Get Weather" and "get_weather" resolve to the same entry.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_spaces() {
        assert_eq!(normalize_name("Get Current Weather"), "get_current_weather");
    }

    #[test]
    fn already_normalized_is_unchanged() {
        assert_eq!(normalize_name("echo"), "echo");
    }

    #[test]
    fn surrounding_whitespace_is_dropped() {
        assert_eq!(normalize_name("  Echo "), "echo");
    }
}
