//! Wire payloads for the supported chat backends.
//!
//! Each submodule mirrors one vendor's request and response JSON. Adapters in
//! [`crate::core::adapters`] translate the uniform message log into these
//! shapes and back.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use serde::Deserialize;

/// Error object vendors put under `"error"` (`message`, a type or status tag,
/// and sometimes a numeric code).
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ApiErrorDetail {
    /// Most specific human-readable description available.
    pub fn summary(&self) -> String {
        self.message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .or(self.kind.as_deref())
            .or(self.status.as_deref())
            .unwrap_or("stream error")
            .to_string()
    }
}
