use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub model: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<ChatUsage>,
}

impl ChatResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
}

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("LLM not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyChoices,
}

/// Client for OpenAI-compatible `chat/completions` endpoints.
///
/// Makes exactly one attempt per call; failures are returned to the caller.
#[derive(Clone)]
pub struct LLMProvider {
    settings: LlmSettings,
    client: reqwest::Client,
}

impl LLMProvider {
    pub fn new(settings: LlmSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { settings, client }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        json_response: bool,
    ) -> Result<ChatResponse, LLMError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(LLMError::NotConfigured("LLM_API_KEY"))?;

        let url = format!(
            "{}/chat/completions",
            self.settings.api_endpoint.trim().trim_end_matches('/')
        );
        let mut payload = serde_json::json!({
            "model": self.settings.model,
            "messages": messages,
            "stream": false
        });
        if json_response {
            payload["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LLMError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %String::from_utf8_lossy(&bytes),
                "failed to parse LLM response JSON"
            );
            LLMError::Json(e)
        })
    }

    pub async fn complete_json(&self, system: &str, user: &str) -> Result<String, LLMError> {
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        let response = self.chat(&messages, true).await?;
        if let Some(usage) = &response.usage {
            tracing::debug!(
                model = ?response.model,
                total_tokens = ?usage.total_tokens,
                "LLM completion finished"
            );
        }
        response
            .first_content()
            .map(|s| s.to_string())
            .ok_or(LLMError::EmptyChoices)
    }
}
