//! Raw HTTP client for the chat-completion backends.
//!
//! One request per call. A failed exchange surfaces its status and is never
//! retried: re-asking could produce a different, mutating tool call.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    ChatMessage, OllamaChatRequest, OllamaChatResponse, OpenAiChatRequest, OpenAiChatResponse,
};
use crate::config::LlmConfig;
use crate::error::{FactoryError, FactoryResult};

/// Supported backend tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAi,
}

impl FromStr for Provider {
    type Err = FactoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAi),
            other => Err(FactoryError::Config(format!(
                "unsupported LLM_PROVIDER: '{other}' (expected ollama/openai)"
            ))),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

impl Provider {
    fn endpoint(self, base_url: &str) -> String {
        match self {
            Provider::Ollama => format!("{base_url}/api/chat"),
            Provider::OpenAi => format!("{base_url}/v1/chat/completions"),
        }
    }
}

/// Anything that can answer one chat exchange with free-form text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> FactoryResult<String>;
}

/// Chat client bound to one provider, endpoint and model.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: Client,
    provider: Provider,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl LlmClient {
    /// Build a client; unknown provider tags fail with `Config`.
    pub fn new(config: &LlmConfig) -> FactoryResult<Self> {
        let provider = config.provider.parse()?;
        if config.model.trim().is_empty() {
            return Err(FactoryError::Config("LLM model cannot be empty".into()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FactoryError::Config(format!("cannot build LLM client: {e}")))?;
        Ok(Self {
            http,
            provider,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn endpoint(&self) -> String {
        self.provider.endpoint(&self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> FactoryResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(provider = %self.provider, status = status.as_u16(), "LLM response");

        if !status.is_success() {
            return Err(FactoryError::Provider {
                provider: self.provider.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| FactoryError::decode(format!("{} response", self.provider), e, &text))
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat(&self, messages: &[ChatMessage]) -> FactoryResult<String> {
        let url = self.endpoint();
        debug!(provider = %self.provider, %url, model = %self.model, "LLM request");

        match self.provider {
            Provider::Ollama => {
                let body = OllamaChatRequest {
                    model: &self.model,
                    messages,
                    stream: false,
                };
                let resp: OllamaChatResponse = self.send(self.http.post(&url).json(&body)).await?;
                Ok(resp.into_text())
            }
            Provider::OpenAi => {
                let body = OpenAiChatRequest {
                    model: &self.model,
                    messages,
                    temperature: 0.0,
                };
                let mut builder = self.http.post(&url).json(&body);
                if let Some(key) = &self.api_key {
                    builder = builder.bearer_auth(key);
                }
                let resp: OpenAiChatResponse = self.send(builder).await?;
                Ok(resp.into_text())
            }
        }
    }
}
