//! Reply generation: deterministic echo or remote completion.

use log::{error, info};

use crate::config::ReplyModeConfig;
use crate::error::Result;
use crate::openai::OpenAiClient;
use crate::types::Turn;

use super::prompt::PromptBuilder;

const TEMPERATURE: f32 = 0.4;

/// How replies are produced. Chosen once at startup.
#[derive(Debug, Clone)]
pub enum ReplyMode {
    Dummy,
    OpenAi(OpenAiClient),
}

pub struct ReplyGenerator {
    mode: ReplyMode,
}

impl ReplyGenerator {
    pub fn new(mode: ReplyMode) -> Self {
        Self { mode }
    }

    pub fn from_config(config: &ReplyModeConfig) -> Result<Self> {
        let mode = match config {
            ReplyModeConfig::Dummy => ReplyMode::Dummy,
            ReplyModeConfig::OpenAi(settings) => {
                ReplyMode::OpenAi(OpenAiClient::from_settings(settings)?)
            }
        };
        Ok(Self::new(mode))
    }

    /// Produce reply text for `new_user_text`.
    ///
    /// Never fails: provider errors come back as an `Error: ...` reply.
    pub async fn generate(&self, history: &[Turn], new_user_text: &str) -> String {
        match &self.mode {
            ReplyMode::Dummy => {
                info!("Dummy reply triggered: {new_user_text}");
                echo_reply(new_user_text)
            }
            ReplyMode::OpenAi(client) => {
                info!("Using OpenAI ({}) for reply: {new_user_text}", client.model());
                let messages = PromptBuilder::build(history, new_user_text);
                match client.complete(&messages, TEMPERATURE).await {
                    Ok(text) => {
                        let reply = text.trim().to_string();
                        info!("OpenAI replied with: {reply}");
                        reply
                    }
                    Err(e) => {
                        error!("OpenAI error: {e}");
                        format!("Error: {}", e.user_message())
                    }
                }
            }
        }
    }
}

fn echo_reply(text: &str) -> String {
    format!("You said: {text}")
}
