//! Runtime configuration.
//!
//! [`Config`] is built once at startup from the built-in provider table, the
//! optional `config.toml`, a `.env` file, and the process environment. It is
//! then handed by reference to the provider registry; adapters never look up
//! configuration on their own.

pub mod data;
pub mod io;

#[cfg(test)]
mod tests;

pub use data::{path_display, ConfigFile};
pub use io::ConfigError;

use crate::core::builtin_providers::load_builtin_providers;
use std::collections::HashMap;
use tracing::debug;

pub const FALLBACK_PROVIDER: &str = "openai";
pub const FALLBACK_MODEL: &str = "gpt-4";

/// Lookup of credentials and per-provider defaults.
pub trait CredentialSource {
    fn api_key(&self, provider: &str) -> Option<&str>;

    fn default_model(&self, provider: &str) -> String;

    /// Endpoint override for `provider`, when one is configured.
    fn base_url(&self, provider: &str) -> Option<&str>;

    fn is_configured(&self, provider: &str) -> bool {
        self.api_key(provider).is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    file: ConfigFile,
    api_keys: HashMap<String, String>,
    base_urls: HashMap<String, String>,
    default_provider: Option<String>,
    default_model: Option<String>,
}

impl Config {
    /// Loads `.env`, the config file, and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(error = %err, "Ignoring unreadable .env file"),
        }

        let file = ConfigFile::load()?;
        Ok(Self::from_sources(file, |key| std::env::var(key).ok()))
    }

    /// Builds a configuration from a parsed config file and a variable lookup.
    pub fn from_sources<F>(file: ConfigFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let mut api_keys = HashMap::new();
        let mut base_urls = HashMap::new();
        for provider in load_builtin_providers() {
            if let Some(key) = non_empty(provider.api_key_env.as_str()) {
                api_keys.insert(provider.id.clone(), key);
            }
            if let Some(url) = provider.base_url_env.as_deref().and_then(non_empty) {
                base_urls.insert(provider.id.clone(), url);
            }
        }

        let default_provider = non_empty("DEFAULT_PROVIDER")
            .or_else(|| file.default_provider.clone())
            .map(|provider| provider.to_ascii_lowercase());
        let default_model = non_empty("DEFAULT_MODEL").or_else(|| file.default_model.clone());

        Self {
            file,
            api_keys,
            base_urls,
            default_provider,
            default_model,
        }
    }

    /// Provider used when none is requested explicitly.
    pub fn default_provider(&self) -> &str {
        self.default_provider.as_deref().unwrap_or(FALLBACK_PROVIDER)
    }

    /// Global fallback model for providers without a per-provider default.
    pub fn fallback_model(&self) -> &str {
        self.default_model.as_deref().unwrap_or(FALLBACK_MODEL)
    }
}

impl CredentialSource for Config {
    fn api_key(&self, provider: &str) -> Option<&str> {
        self.api_keys
            .get(&provider.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn default_model(&self, provider: &str) -> String {
        if let Some(model) = self.file.get_default_model(provider) {
            return model.to_string();
        }

        crate::core::builtin_providers::find_builtin_provider(provider)
            .map(|p| p.default_model.clone())
            .unwrap_or_else(|| self.fallback_model().to_string())
    }

    fn base_url(&self, provider: &str) -> Option<&str> {
        self.base_urls
            .get(&provider.to_ascii_lowercase())
            .map(String::as_str)
    }
}
