//! Socket Mode envelopes and the Events API payloads they carry.

use serde::Deserialize;
use serde_json::Value;
use strum::Display;

use crate::error::Result;

/// Events API `type` of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    /// The bot was mentioned with `<@BOT>` in a channel
    AppMention,
    /// Generic message channel (DMs, channel posts, edits, ...)
    Message,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Im,
    Mpim,
    Channel,
    Group,
    #[serde(other)]
    Other,
}

/// A chat event as delivered by Slack, with every field the router may need.
///
/// Slack omits fields freely, so everything but the kind is optional and
/// validated by the router.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub subtype: Option<String>,
    pub channel: Option<String>,
    pub channel_type: Option<ChannelType>,
    pub user: Option<String>,
    pub bot_id: Option<String>,
    pub text: Option<String>,
}

impl InboundEvent {
    pub fn is_direct_message(&self) -> bool {
        self.channel_type == Some(ChannelType::Im)
    }
}

#[derive(Debug, Deserialize)]
struct EventCallback {
    #[serde(rename = "type")]
    callback_type: String,
    event: InboundEvent,
}

/// One frame received on the Socket Mode websocket.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketEnvelope {
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(rename = "type")]
    pub envelope_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl SocketEnvelope {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn is_disconnect(&self) -> bool {
        self.envelope_type == "disconnect"
    }

    /// Extracts the chat event from an `events_api` envelope.
    pub fn inbound_event(&self) -> Result<Option<InboundEvent>> {
        if self.envelope_type != "events_api" {
            return Ok(None);
        }
        let callback: EventCallback = serde_json::from_value(self.payload.clone())?;
        if callback.callback_type != "event_callback" {
            return Ok(None);
        }
        Ok(Some(callback.event))
    }
}
