//! Inbound event classification and the reply pipeline.

use std::future::Future;

use log::{debug, error, info};
use strum::Display;

use crate::error::Result;
use crate::memory::ConversationStore;
use crate::slack::{EventKind, InboundEvent};
use crate::types::{ConversationKey, Turn};

use super::reply::ReplyGenerator;

/// Subtypes that must never produce a reply: our own posts, edits and deletions.
const IGNORED_SUBTYPES: [&str; 3] = ["bot_message", "message_changed", "message_deleted"];

/// Outbound capability: post `text` into `channel`.
pub trait ReplySender {
    fn send_reply(&self, channel: &str, text: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Why an inbound event was dropped without a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum IgnoreReason {
    UnsupportedKind,
    IgnoredSubtype,
    ChannelPost,
    BotSender,
    EmptyText,
    MissingChannel,
    MissingUser,
}

/// Outcome of handling one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Replied(String),
    Ignored(IgnoreReason),
}

/// An event that passed every filter.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AcceptedMessage {
    key: ConversationKey,
    channel: String,
    text: String,
}

/// Routes inbound events through memory, reply generation and the sender.
pub struct EventRouter<S> {
    store: ConversationStore,
    generator: ReplyGenerator,
    sender: S,
    bot_mention: String,
}

impl<S: ReplySender> EventRouter<S> {
    pub fn new(
        store: ConversationStore,
        generator: ReplyGenerator,
        sender: S,
        bot_user_id: &str,
    ) -> Self {
        Self {
            store,
            generator,
            sender,
            bot_mention: format!("<@{bot_user_id}>"),
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Handle one inbound event end to end.
    pub async fn handle_inbound(&mut self, event: &InboundEvent) -> Disposition {
        debug!("Handling {} event: {:?}", event.kind, event);

        let accepted = match self.classify(event) {
            Ok(accepted) => accepted,
            Err(reason) => {
                debug!("Ignored {} event: {reason}", event.kind);
                return Disposition::Ignored(reason);
            }
        };
        info!(
            "Received message in conversation {}: {}",
            accepted.key, accepted.text
        );

        self.store.append(&accepted.key, Turn::user(accepted.text.as_str()));
        let history = self.store.get(&accepted.key);

        let reply = self.generator.generate(&history, &accepted.text).await;

        match self.sender.send_reply(&accepted.channel, &reply).await {
            Ok(()) => info!("Replied in channel {}: {reply}", accepted.channel),
            Err(e) => error!("Failed to send reply to channel {}: {e}", accepted.channel),
        }

        self.store.append(&accepted.key, Turn::assistant(reply.as_str()));
        Disposition::Replied(reply)
    }

    fn classify(
        &self,
        event: &InboundEvent,
    ) -> std::result::Result<AcceptedMessage, IgnoreReason> {
        if event
            .subtype
            .as_deref()
            .is_some_and(|subtype| IGNORED_SUBTYPES.contains(&subtype))
        {
            return Err(IgnoreReason::IgnoredSubtype);
        }

        match event.kind {
            EventKind::AppMention => {}
            EventKind::Message => {
                // Multi-party channels only answer explicit mentions.
                if !event.is_direct_message() {
                    return Err(IgnoreReason::ChannelPost);
                }
                if event.bot_id.is_some() {
                    return Err(IgnoreReason::BotSender);
                }
            }
            EventKind::Other => return Err(IgnoreReason::UnsupportedKind),
        }

        let raw = event.text.as_deref().unwrap_or_default().trim();
        if raw.is_empty() {
            return Err(IgnoreReason::EmptyText);
        }
        let text = strip_mention(raw, &self.bot_mention);
        if text.is_empty() {
            return Err(IgnoreReason::EmptyText);
        }

        let channel = non_empty(event.channel.as_deref()).ok_or(IgnoreReason::MissingChannel)?;
        let key = if event.is_direct_message() {
            non_empty(event.user.as_deref()).ok_or(IgnoreReason::MissingUser)?
        } else {
            channel
        };

        Ok(AcceptedMessage {
            key: ConversationKey::new(key),
            channel: channel.to_string(),
            text,
        })
    }
}

/// Removes every `mention` token and the whitespace that follows it.
fn strip_mention(text: &str, mention: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(mention) {
        stripped.push_str(&rest[..pos]);
        rest = rest[pos + mention.len()..].trim_start();
    }
    stripped.push_str(rest);
    stripped.trim().to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
