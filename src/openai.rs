use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiSettings;
use crate::error::{BotError, Result};
use crate::types::Turn;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: String,
    client: reqwest::Client,
    model: String,
    completions_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, api_base: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            client,
            model,
            completions_url: format!("{}/chat/completions", api_base.trim_end_matches('/')),
        })
    }

    pub fn from_settings(settings: &OpenAiSettings) -> Result<Self> {
        Self::new(
            settings.api_key.clone(),
            settings.model.clone(),
            &settings.api_base,
            settings.timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `messages` and return the text of the first choice, untrimmed.
    pub async fn complete(&self, messages: &[Turn], temperature: f32) -> Result<String> {
        debug!(
            "Sending request to OpenAI API with {} messages",
            messages.len()
        );

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature,
        };

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::OpenAiApi { status, message });
        }

        let body = response.text().await?;
        let api_response: ChatCompletionResponse = serde_json::from_str(&body)?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BotError::OpenAiResponse("No choices in response".to_string()))?
            .message
            .content
            .ok_or_else(|| BotError::OpenAiResponse("Choice has no content".to_string()))?;

        debug!("Received response from OpenAI API");
        Ok(content)
    }
}
