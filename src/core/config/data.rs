use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Contents of the optional `config.toml` file.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Provider used when `--provider` is not given (e.g., "anthropic")
    pub default_provider: Option<String>,
    /// Model used for providers the workbench does not know about
    pub default_model: Option<String>,
    /// Per-provider model overrides
    /// Key: provider (e.g., "openai")
    /// Value: model (e.g., "gpt-4o")
    #[serde(default)]
    pub default_models: HashMap<String, String>,
}

impl ConfigFile {
    pub fn set_default_model(&mut self, provider: &str, model: impl Into<String>) {
        self.default_models
            .insert(provider.to_ascii_lowercase(), model.into());
    }

    pub fn unset_default_model(&mut self, provider: &str) -> Option<String> {
        self.default_models.remove(&provider.to_ascii_lowercase())
    }

    pub fn get_default_model(&self, provider: &str) -> Option<&str> {
        self.default_models
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(provider))
            .map(|(_, model)| model.as_str())
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
