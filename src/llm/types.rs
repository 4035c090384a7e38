//! Wire types for the two chat-completion backends.
//!
//! Serde-serializable to JSON for HTTP calls. Only the fields we read are
//! modelled; everything else in the envelopes is ignored.

use serde::{Deserialize, Serialize};

/// A single message in the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Request body for Ollama's `/api/chat`.
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
}

/// Response from Ollama's `/api/chat` (non-streaming).
#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    #[serde(default)]
    pub message: Option<ReplyMessage>,
}

/// Request body for an OpenAI-compatible `/v1/chat/completions`.
#[derive(Debug, Serialize)]
pub struct OpenAiChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
}

/// Response from an OpenAI-compatible `/v1/chat/completions`.
#[derive(Debug, Deserialize)]
pub struct OpenAiChatResponse {
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiChoice {
    #[serde(default)]
    pub message: Option<ReplyMessage>,
}

/// Assistant message inside either envelope.
#[derive(Debug, Deserialize)]
pub struct ReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl OllamaChatResponse {
    /// Reply text, empty when the envelope has none.
    pub fn into_text(self) -> String {
        self.message.and_then(|m| m.content).unwrap_or_default()
    }
}

impl OpenAiChatResponse {
    /// Text of the first choice, empty when the envelope has none.
    pub fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default()
    }
}
