use async_trait::async_trait;
use tracing::debug;

use super::{read_json, send_json, stream_payload_error, ChatProvider, ProviderError};
use crate::api::openai::{ChatCompletion, ChatMessage, ChatRequest, ChatResponse};
use crate::core::builtin_providers::ProviderKind;
use crate::core::chat_stream::{sse_text_stream, SseEvent, TextStream};
use crate::core::message::Message;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

/// Chat Completions backend. Messages, system role included, go out unchanged.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    fn build_request(&self, messages: &[Message], stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|message| ChatMessage {
                    role: message.role.as_str().to_string(),
                    content: message.content.clone(),
                })
                .collect(),
            stream,
        }
    }

    async fn send(
        &self,
        messages: &[Message],
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let request = self.build_request(messages, stream);
        debug!(
            provider = "openai",
            model = %self.model,
            messages = request.messages.len(),
            stream,
            "Sending chat completion request"
        );

        let url = construct_api_url(&self.base_url, "chat/completions");
        let http_request = add_auth_headers(
            self.client.post(url),
            ProviderKind::OpenAi,
            &self.api_key,
        );
        send_json(http_request, &request).await
    }
}

/// Interprets one `data:` payload of a streaming completion.
fn parse_stream_payload(payload: &str) -> Result<SseEvent, ProviderError> {
    if payload == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => {
            let content = response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .filter(|content| !content.is_empty());
            Ok(content.map(SseEvent::Text).unwrap_or(SseEvent::Skip))
        }
        Err(_) if payload.trim().is_empty() => Ok(SseEvent::Skip),
        Err(_) => Err(stream_payload_error(payload)),
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_response(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let response = self.send(messages, false).await?;
        let completion: ChatCompletion = read_json(response).await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("response contained no choices".into()))?;
        Ok(choice.message.content.unwrap_or_default())
    }

    async fn generate_stream(&self, messages: &[Message]) -> Result<TextStream, ProviderError> {
        let response = self.send(messages, true).await?;
        Ok(sse_text_stream(response.bytes_stream(), parse_stream_payload))
    }
}
