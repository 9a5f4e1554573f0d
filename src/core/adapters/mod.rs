//! Provider adapters.
//!
//! Every backend is reached through [`ChatProvider`]: give it the full message
//! sequence (system message first) and get back either the complete reply or
//! a [`TextStream`] of fragments. The three implementations differ only in
//! how they translate that sequence to their vendor's wire shape.

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::builtin_providers::ProviderKind;
use crate::core::chat_stream::{summarize_api_error, TextStream};
use crate::core::message::Message;

#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;

    /// Sends `messages` and waits for the complete reply.
    async fn generate_response(&self, messages: &[Message]) -> Result<String, ProviderError>;

    /// Sends `messages` and returns the reply as it arrives.
    ///
    /// Concatenating every fragment yields the text
    /// [`generate_response`](Self::generate_response) would return.
    async fn generate_stream(&self, messages: &[Message]) -> Result<TextStream, ProviderError>;
}

/// Failure surfaced by a backend call.
#[derive(Debug)]
pub enum ProviderError {
    /// The request could not be sent or the response body could not be read.
    Transport(reqwest::Error),
    /// The backend answered with an error.
    Api {
        status: Option<u16>,
        message: String,
    },
    /// The backend answered with something that is not a chat reply.
    Malformed(String),
    /// The backend refused to answer, with the reason it gave.
    Blocked(String),
    /// There is no user turn to send.
    EmptyConversation,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(err) => write!(f, "Request failed: {err}"),
            ProviderError::Api {
                status: Some(status),
                message,
            } => write!(f, "API error ({status}): {message}"),
            ProviderError::Api {
                status: None,
                message,
            } => write!(f, "API error: {message}"),
            ProviderError::Malformed(detail) => {
                write!(f, "Unexpected response from provider: {detail}")
            }
            ProviderError::Blocked(reason) => write!(f, "Response blocked by provider ({reason})"),
            ProviderError::EmptyConversation => write!(f, "There is no message to send"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProviderError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err)
    }
}

/// Sends a JSON body and turns non-2xx replies into [`ProviderError::Api`].
pub(crate) async fn send_json<T: Serialize + ?Sized>(
    request: reqwest::RequestBuilder,
    body: &T,
) -> Result<reqwest::Response, ProviderError> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(ProviderError::Api {
        status: Some(status.as_u16()),
        message: summarize_api_error(&error_text),
    })
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|err| ProviderError::Malformed(err.to_string()))
}

/// Error for a stream payload that is neither a known event nor valid JSON.
pub(crate) fn stream_payload_error(payload: &str) -> ProviderError {
    ProviderError::Api {
        status: None,
        message: summarize_api_error(payload),
    }
}
