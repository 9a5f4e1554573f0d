//! Provider registry.
//!
//! Turns a provider name and an optional model into a ready [`ChatProvider`].
//! Credentials are checked before an adapter is built, so a missing key is
//! reported without touching the network.

use std::error::Error;
use std::fmt;

use tracing::debug;

use crate::core::adapters::{AnthropicProvider, ChatProvider, GeminiProvider, OpenAiProvider};
use crate::core::builtin_providers::{
    builtin_provider_ids, find_builtin_provider, load_builtin_providers, BuiltinProvider,
    ProviderKind,
};
use crate::core::config::CredentialSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The provider exists but has no API key.
    Configuration { provider: String, env_var: String },
    /// The name is not one of the built-in providers.
    UnknownProvider { name: String },
}

impl ResolveError {
    pub fn quick_fixes(&self) -> Vec<String> {
        match self {
            ResolveError::Configuration { provider, env_var } => vec![
                format!("export {env_var}=...            # Set the key for this shell"),
                format!("echo '{env_var}=...' >> .env    # Keep it in a local .env file"),
                "awb providers                   # Check which providers are ready".to_string(),
                format!("awb -p <other>                  # Use another provider than '{provider}'"),
            ],
            ResolveError::UnknownProvider { .. } => vec![
                "awb providers                   # List the known providers".to_string(),
            ],
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::Configuration { .. } => 2,
            ResolveError::UnknownProvider { .. } => 1,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Configuration { provider, env_var } => write!(
                f,
                "No API key configured for provider '{provider}'. Set {env_var} in your environment or .env file."
            ),
            ResolveError::UnknownProvider { name } => write!(
                f,
                "Unknown provider '{name}'. Valid providers: {}",
                builtin_provider_ids()
            ),
        }
    }
}

impl Error for ResolveError {}

/// Seam between the session and adapter construction.
pub trait ProviderResolver {
    fn resolve(
        &self,
        provider: &str,
        model: Option<&str>,
    ) -> Result<Box<dyn ChatProvider>, ResolveError>;
}

/// Builds adapters from the built-in provider table and a credential source.
pub struct ProviderRegistry<'a, S: CredentialSource + ?Sized> {
    source: &'a S,
    client: reqwest::Client,
}

impl<'a, S: CredentialSource + ?Sized> ProviderRegistry<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self::with_client(source, reqwest::Client::new())
    }

    pub fn with_client(source: &'a S, client: reqwest::Client) -> Self {
        Self { source, client }
    }

    fn lookup(&self, name: &str) -> Result<&'static BuiltinProvider, ResolveError> {
        find_builtin_provider(name.trim()).ok_or_else(|| ResolveError::UnknownProvider {
            name: name.trim().to_string(),
        })
    }
}

impl<S: CredentialSource + ?Sized> ProviderResolver for ProviderRegistry<'_, S> {
    fn resolve(
        &self,
        provider: &str,
        model: Option<&str>,
    ) -> Result<Box<dyn ChatProvider>, ResolveError> {
        let builtin = self.lookup(provider)?;

        let api_key = self
            .source
            .api_key(&builtin.id)
            .ok_or_else(|| ResolveError::Configuration {
                provider: builtin.id.clone(),
                env_var: builtin.api_key_env.clone(),
            })?
            .to_string();

        let model = model
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.source.default_model(&builtin.id));
        let base_url = self
            .source
            .base_url(&builtin.id)
            .unwrap_or(builtin.base_url.as_str())
            .to_string();

        debug!(provider = %builtin.id, model = %model, base_url = %base_url, "Resolved provider");

        let client = self.client.clone();
        let adapter: Box<dyn ChatProvider> = match builtin.mode {
            ProviderKind::OpenAi => Box::new(OpenAiProvider::new(client, api_key, model, base_url)),
            ProviderKind::Anthropic => {
                Box::new(AnthropicProvider::new(client, api_key, model, base_url))
            }
            ProviderKind::Gemini => Box::new(GeminiProvider::new(client, api_key, model, base_url)),
        };
        Ok(adapter)
    }
}

/// One row of `awb providers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub id: String,
    pub display_name: String,
    pub configured: bool,
    pub default_model: String,
    pub api_key_env: String,
}

pub fn provider_statuses<S: CredentialSource + ?Sized>(source: &S) -> Vec<ProviderStatus> {
    load_builtin_providers()
        .iter()
        .map(|provider| ProviderStatus {
            id: provider.id.clone(),
            display_name: provider.display_name.clone(),
            configured: source.is_configured(&provider.id),
            default_model: source.default_model(&provider.id),
            api_key_env: provider.api_key_env.clone(),
        })
        .collect()
}
