//! Built-in provider configuration
//!
//! The provider table is embedded from `builtin_providers.toml` at build time.
//! Each entry names the wire shape (`mode`) used to talk to the backend, the
//! default model, and the environment variables consulted for credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Request/response shape spoken by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinProvider {
    pub id: String,
    pub display_name: String,
    pub mode: ProviderKind,
    pub base_url: String,
    pub default_model: String,
    pub api_key_env: String,
    pub base_url_env: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BuiltinProvidersConfig {
    providers: Vec<BuiltinProvider>,
}

/// Load built-in providers from the embedded configuration
pub fn load_builtin_providers() -> &'static [BuiltinProvider] {
    static PROVIDERS: OnceLock<Vec<BuiltinProvider>> = OnceLock::new();
    const CONFIG_CONTENT: &str = include_str!("../builtin_providers.toml");

    PROVIDERS.get_or_init(|| {
        let config: BuiltinProvidersConfig =
            toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_providers.toml");
        config.providers
    })
}

/// Find a built-in provider by ID (case-insensitive)
pub fn find_builtin_provider(id: &str) -> Option<&'static BuiltinProvider> {
    load_builtin_providers()
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
}

/// Comma separated list of every provider ID, for error messages.
pub fn builtin_provider_ids() -> String {
    load_builtin_providers()
        .iter()
        .map(|p| p.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_builtin_providers() {
        let providers = load_builtin_providers();
        let provider_ids: Vec<&str> = providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(provider_ids, vec!["openai", "anthropic", "google"]);
    }

    #[test]
    fn test_find_builtin_provider() {
        let provider = find_builtin_provider("OpenAI");
        assert_eq!(provider.map(|p| p.id.as_str()), Some("openai"));

        let provider = find_builtin_provider("google").unwrap();
        assert_eq!(provider.mode, ProviderKind::Gemini);
        assert_eq!(provider.default_model, "gemini-2.0-flash-exp");

        assert!(find_builtin_provider("nonexistent").is_none());
    }

    #[test]
    fn test_default_models() {
        assert_eq!(find_builtin_provider("openai").unwrap().default_model, "gpt-4");
        assert_eq!(
            find_builtin_provider("anthropic").unwrap().default_model,
            "claude-3-5-sonnet-20241022"
        );
    }

    #[test]
    fn test_provider_properties() {
        for provider in load_builtin_providers() {
            assert!(!provider.display_name.is_empty());
            assert!(provider.base_url.starts_with("https://"));
            assert!(provider.api_key_env.ends_with("_API_KEY"));
        }
    }

    #[test]
    fn test_provider_id_list() {
        assert_eq!(builtin_provider_ids(), "openai, anthropic, google");
    }
}
