use async_trait::async_trait;
use tracing::debug;

use super::{read_json, send_json, stream_payload_error, ChatProvider, ProviderError};
use crate::api::gemini::{Content, GenerateContentRequest, GenerateContentResponse};
use crate::api::gemini::{ROLE_MODEL, ROLE_USER};
use crate::core::builtin_providers::ProviderKind;
use crate::core::chat_stream::{sse_text_stream, SseEvent, TextStream};
use crate::core::message::{Message, Role};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

/// Gemini backend.
///
/// Gemini has no system role in chat history, so the system text is merged
/// into the outgoing message of the current call only. Every call rebuilds a
/// [`GeminiChat`] from the earlier turns and sends just the final one.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

/// Chat session rebuilt from prior turns for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiChat {
    history: Vec<Content>,
}

impl GeminiChat {
    pub fn start(history: Vec<Content>) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Request carrying the history followed by `text` as a user turn.
    pub fn send_message(self, text: impl Into<String>) -> GenerateContentRequest {
        let mut contents = self.history;
        contents.push(Content::text(ROLE_USER, text));
        GenerateContentRequest { contents }
    }
}

fn history_role(role: Role) -> Option<&'static str> {
    match role {
        Role::User => Some(ROLE_USER),
        Role::Assistant => Some(ROLE_MODEL),
        Role::System => None,
    }
}

/// Splits `messages` into the rebuilt chat and the text to send.
pub fn prepare_chat(messages: &[Message]) -> Result<(GeminiChat, String), ProviderError> {
    let system = messages
        .iter()
        .filter(|message| message.is_system())
        .map(|message| message.content.as_str())
        .last()
        .filter(|text| !text.is_empty());
    let turns: Vec<&Message> = messages.iter().filter(|m| !m.is_system()).collect();

    let (last, earlier) = turns
        .split_last()
        .ok_or(ProviderError::EmptyConversation)?;

    let history = earlier
        .iter()
        .filter_map(|message| {
            history_role(message.role).map(|role| Content::text(role, message.content.clone()))
        })
        .collect();

    let outgoing = match system {
        Some(system) => format!("{system}\n\n{}", last.content),
        None => last.content.clone(),
    };

    Ok((GeminiChat::start(history), outgoing))
}

impl GeminiProvider {
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

    async fn send(
        &self,
        messages: &[Message],
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let (chat, outgoing) = prepare_chat(messages)?;
        debug!(
            provider = "gemini",
            model = %self.model,
            history = chat.history().len(),
            stream,
            "Sending generateContent request"
        );
        let request = chat.send_message(outgoing);

        let endpoint = if stream {
            format!("models/{}:streamGenerateContent?alt=sse", self.model)
        } else {
            format!("models/{}:generateContent", self.model)
        };
        let url = construct_api_url(&self.base_url, &endpoint);
        let http_request = add_auth_headers(
            self.client.post(url),
            ProviderKind::Gemini,
            &self.api_key,
        );
        send_json(http_request, &request).await
    }
}

/// Text of one response body, or the error or refusal it carries.
fn response_text(response: &GenerateContentResponse) -> Result<Option<String>, ProviderError> {
    if let Some(error) = &response.error {
        return Err(ProviderError::Api {
            status: error.code,
            message: error.summary(),
        });
    }
    if let Some(reason) = response.block_reason() {
        return Err(ProviderError::Blocked(reason.to_string()));
    }
    Ok(response.text())
}

fn parse_stream_payload(payload: &str) -> Result<SseEvent, ProviderError> {
    if payload.trim().is_empty() {
        return Ok(SseEvent::Skip);
    }
    let response: GenerateContentResponse =
        serde_json::from_str(payload).map_err(|_| stream_payload_error(payload))?;
    Ok(response_text(&response)?
        .filter(|text| !text.is_empty())
        .map(SseEvent::Text)
        .unwrap_or(SseEvent::Skip))
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_response(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let response = self.send(messages, false).await?;
        let reply: GenerateContentResponse = read_json(response).await?;
        response_text(&reply)?
            .ok_or_else(|| ProviderError::Malformed("response contained no candidates".into()))
    }

    async fn generate_stream(&self, messages: &[Message]) -> Result<TextStream, ProviderError> {
        let response = self.send(messages, true).await?;
        Ok(sse_text_stream(response.bytes_stream(), parse_stream_payload))
    }
}
