use async_trait::async_trait;
use tracing::debug;

use super::{read_json, send_json, stream_payload_error, ChatProvider, ProviderError};
use crate::api::anthropic::{
    ContentBlock, ContentDelta, MessageParam, MessagesRequest, MessagesResponse, StreamEvent,
    MAX_TOKENS,
};
use crate::core::builtin_providers::ProviderKind;
use crate::core::chat_stream::{sse_text_stream, SseEvent, TextStream};
use crate::core::message::Message;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

/// Sent when the conversation carries no usable system message.
pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a helpful coding assistant.";

/// Messages API backend. The system instruction travels as the top-level
/// `system` parameter and never appears among the turns.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
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

    fn build_request(&self, messages: &[Message], stream: bool) -> MessagesRequest {
        let mut system = None;
        let mut turns = Vec::with_capacity(messages.len());
        for message in messages {
            if message.is_system() {
                system = Some(message.content.as_str());
            } else {
                turns.push(MessageParam {
                    role: message.role.as_str().to_string(),
                    content: message.content.clone(),
                });
            }
        }

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system
                .filter(|text| !text.is_empty())
                .unwrap_or(FALLBACK_SYSTEM_PROMPT)
                .to_string(),
            messages: turns,
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
            provider = "anthropic",
            model = %self.model,
            messages = request.messages.len(),
            stream,
            "Sending messages request"
        );

        let url = construct_api_url(&self.base_url, "messages");
        let http_request = add_auth_headers(
            self.client.post(url),
            ProviderKind::Anthropic,
            &self.api_key,
        );
        send_json(http_request, &request).await
    }
}

fn parse_stream_payload(payload: &str) -> Result<SseEvent, ProviderError> {
    let event = match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => event,
        Err(_) if payload.trim().is_empty() => return Ok(SseEvent::Skip),
        Err(_) => return Err(stream_payload_error(payload)),
    };

    match event {
        StreamEvent::ContentBlockDelta {
            delta: ContentDelta::TextDelta { text },
        } if !text.is_empty() => Ok(SseEvent::Text(text)),
        StreamEvent::MessageStop => Ok(SseEvent::Done),
        StreamEvent::Error { error } => Err(ProviderError::Api {
            status: error.code,
            message: error.summary(),
        }),
        _ => Ok(SseEvent::Skip),
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_response(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let response = self.send(messages, false).await?;
        let reply: MessagesResponse = read_json(response).await?;

        let mut texts = reply
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .peekable();
        if texts.peek().is_none() {
            return Err(ProviderError::Malformed(
                "response contained no text content".into(),
            ));
        }
        Ok(texts.collect())
    }

    async fn generate_stream(&self, messages: &[Message]) -> Result<TextStream, ProviderError> {
        let response = self.send(messages, true).await?;
        Ok(sse_text_stream(response.bytes_stream(), parse_stream_payload))
    }
}
