use serde::{Deserialize, Serialize};

use crate::{
    config::OpenAiConfig,
    error::{AppError, Result},
};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Thin client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionClient {
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Sends `prompt` as the only user message of a new conversation and
    /// returns the first choice's text unchanged.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Chat completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Chat completion endpoint returned an error");
            return Err(AppError::ExternalService(format!(
                "Chat completion endpoint returned {}: {}",
                status, body
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse chat completion response: {}", e))
        })?;

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            AppError::ExternalService("Chat completion response contained no choices".to_string())
        })?;

        choice.message.content.ok_or_else(|| {
            AppError::ExternalService("Chat completion choice has no message content".to_string())
        })
    }
}
