//! Authentication utilities for API requests
//!
//! This module adds provider-specific authentication headers to HTTP requests.

use crate::api::anthropic::ANTHROPIC_VERSION;
use crate::core::builtin_providers::ProviderKind;

/// Add provider-specific authentication headers to an HTTP request
///
/// Each wire shape authenticates differently:
/// - OpenAI: standard `Authorization: Bearer` header
/// - Anthropic: `x-api-key` header plus `anthropic-version`
/// - Gemini: `x-goog-api-key` header, so the key never lands in a URL
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    kind: ProviderKind,
    api_key: &str,
) -> reqwest::RequestBuilder {
    match kind {
        ProviderKind::OpenAi => request.header("Authorization", format!("Bearer {api_key}")),
        ProviderKind::Anthropic => request
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION),
        ProviderKind::Gemini => request.header("x-goog-api-key", api_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(kind: ProviderKind) -> reqwest::Request {
        let client = reqwest::Client::new();
        add_auth_headers(client.post("https://example.com"), kind, "test-key")
            .build()
            .unwrap()
    }

    #[test]
    fn test_openai_auth_headers() {
        let request = built(ProviderKind::OpenAi);
        assert_eq!(request.headers()["authorization"], "Bearer test-key");
    }

    #[test]
    fn test_anthropic_auth_headers() {
        let request = built(ProviderKind::Anthropic);
        assert_eq!(request.headers()["x-api-key"], "test-key");
        assert_eq!(request.headers()["anthropic-version"], "2023-06-01");
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn test_gemini_auth_headers() {
        let request = built(ProviderKind::Gemini);
        assert_eq!(request.headers()["x-goog-api-key"], "test-key");
        assert!(!request.url().as_str().contains("test-key"));
    }
}
