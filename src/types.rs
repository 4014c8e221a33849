//! Common types used throughout the warpi bot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a message in the conversation.
///
/// Maps to OpenAI chat completion message roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the human user
    User,
    /// Message from the AI assistant
    Assistant,
    /// System prompt or instructions
    System,
}

/// One role-tagged message in a conversation.
///
/// Fields are private so a turn cannot change once created. Serializes as
/// `{"role": ..., "content": ...}`, which is the shape the completion API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: MessageRole,
    content: String,
}

impl Turn {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Identifies one ongoing exchange: a channel id, or the partner's user id in a DM.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey(String);

impl ConversationKey {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn turn_serializes_as_chat_message() {
        let value = serde_json::to_value(Turn::assistant("hi there")).expect("serialize");
        assert_eq!(value, json!({"role": "assistant", "content": "hi there"}));
    }
}
