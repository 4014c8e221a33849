//! Prompt assembly for the completion call.

use crate::types::Turn;

pub const SYSTEM_PROMPT: &str =
    "You are Warpi, a helpful Slack bot. Answer clearly and use past context when relevant.";

/// Builds the message list sent to the completion endpoint.
pub struct PromptBuilder;

impl PromptBuilder {
    /// System prompt, then `history` as-is, then the new user message.
    pub fn build(history: &[Turn], new_user_text: &str) -> Vec<Turn> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Turn::system(SYSTEM_PROMPT));
        messages.extend_from_slice(history);
        messages.push(Turn::user(new_user_text));
        messages
    }
}
