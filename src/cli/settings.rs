//! `awb set` / `awb unset`.
//!
//! Each key is handled by a [`SettingHandler`] that edits a [`ConfigFile`]
//! in memory; the caller saves the file once the edit succeeded.

use std::fmt;

use crate::core::builtin_providers::{builtin_provider_ids, find_builtin_provider};
use crate::core::config::ConfigFile;

#[derive(Debug)]
pub enum SettingError {
    UnknownKey(String),
    UnknownProvider {
        input: String,
    },
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
}

impl SettingError {
    pub fn print(&self) {
        match self {
            SettingError::UnknownKey(key) => {
                eprintln!("❌ Unknown config key: {key}");
                eprintln!("   Known keys: {}", keys().join(", "));
            }
            SettingError::UnknownProvider { input } => {
                eprintln!(
                    "❌ Unknown provider: {input}. Valid providers: {}",
                    builtin_provider_ids()
                );
            }
            SettingError::MissingArgs { hint, example } => {
                eprintln!("⚠️  {hint}");
                eprintln!("Example: {example}");
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown config key: {key}"),
            SettingError::UnknownProvider { input } => write!(f, "Unknown provider: {input}"),
            SettingError::MissingArgs { hint, .. } => write!(f, "{hint}"),
        }
    }
}

impl std::error::Error for SettingError {}

pub trait SettingHandler: Send + Sync {
    fn key(&self) -> &'static str;

    /// Applies `args` and returns the message to show.
    fn set(&self, args: &[String], config: &mut ConfigFile) -> Result<String, SettingError>;

    fn unset(&self, arg: Option<&str>, config: &mut ConfigFile) -> Result<String, SettingError>;

    /// Current value, one line per entry, for `awb set` without arguments.
    fn format(&self, config: &ConfigFile) -> String;
}

fn validate_provider(input: &str) -> Result<String, SettingError> {
    find_builtin_provider(input.trim())
        .map(|provider| provider.id.clone())
        .ok_or_else(|| SettingError::UnknownProvider {
            input: input.trim().to_string(),
        })
}

pub struct DefaultProviderHandler;

impl SettingHandler for DefaultProviderHandler {
    fn key(&self) -> &'static str {
        "default-provider"
    }

    fn set(&self, args: &[String], config: &mut ConfigFile) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: "To set a default provider, specify the provider:",
                example: "awb set default-provider anthropic",
            });
        };
        let provider = validate_provider(input)?;
        let message = format!("✅ Set default-provider to: {provider}");
        config.default_provider = Some(provider);
        Ok(message)
    }

    fn unset(&self, _arg: Option<&str>, config: &mut ConfigFile) -> Result<String, SettingError> {
        config.default_provider = None;
        Ok("✅ Unset default-provider".to_string())
    }

    fn format(&self, config: &ConfigFile) -> String {
        match &config.default_provider {
            Some(provider) => format!("  default-provider: {provider}"),
            None => "  default-provider: (unset)".to_string(),
        }
    }
}

pub struct DefaultModelHandler;

impl SettingHandler for DefaultModelHandler {
    fn key(&self) -> &'static str {
        "default-model"
    }

    fn set(&self, args: &[String], config: &mut ConfigFile) -> Result<String, SettingError> {
        let [provider, model @ ..] = args else {
            return Err(Self::missing_set_args());
        };
        if model.is_empty() {
            return Err(Self::missing_set_args());
        }

        let provider = validate_provider(provider)?;
        let model = model.join(" ");
        let message = format!("✅ Set default-model for provider '{provider}' to: {model}");
        config.set_default_model(&provider, model);
        Ok(message)
    }

    fn unset(&self, arg: Option<&str>, config: &mut ConfigFile) -> Result<String, SettingError> {
        let Some(provider) = arg else {
            return Err(SettingError::MissingArgs {
                hint: "To unset a default model, specify the provider:",
                example: "awb unset default-model openai",
            });
        };
        let provider = validate_provider(provider)?;
        config.unset_default_model(&provider);
        Ok(format!("✅ Unset default-model for provider: {provider}"))
    }

    fn format(&self, config: &ConfigFile) -> String {
        if config.default_models.is_empty() {
            return "  default-model: (unset)".to_string();
        }
        let mut entries: Vec<_> = config.default_models.iter().collect();
        entries.sort();
        let mut lines = vec!["  default-model:".to_string()];
        lines.extend(
            entries
                .into_iter()
                .map(|(provider, model)| format!("    {provider}: {model}")),
        );
        lines.join("\n")
    }
}

impl DefaultModelHandler {
    fn missing_set_args() -> SettingError {
        SettingError::MissingArgs {
            hint: "To set a default model, specify the provider and model:",
            example: "awb set default-model openai gpt-4o",
        }
    }
}

const HANDLERS: &[&dyn SettingHandler] = &[&DefaultProviderHandler, &DefaultModelHandler];

pub fn keys() -> Vec<&'static str> {
    HANDLERS.iter().map(|handler| handler.key()).collect()
}

fn handler(key: &str) -> Result<&'static dyn SettingHandler, SettingError> {
    HANDLERS
        .iter()
        .copied()
        .find(|handler| handler.key() == key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))
}

pub fn apply_set(
    config: &mut ConfigFile,
    key: &str,
    args: &[String],
) -> Result<String, SettingError> {
    handler(key)?.set(args, config)
}

pub fn apply_unset(
    config: &mut ConfigFile,
    key: &str,
    arg: Option<&str>,
) -> Result<String, SettingError> {
    handler(key)?.unset(arg, config)
}

/// Every setting with its current value.
pub fn format_all(config: &ConfigFile) -> String {
    let mut lines = vec!["Current configuration:".to_string()];
    lines.extend(HANDLERS.iter().map(|handler| handler.format(config)));
    lines.join("\n")
}
