//! Slack transport: Web API client, Socket Mode runner and event payloads.

mod api;
mod event;
mod socket;

pub use api::SlackApiClient;
pub use event::{ChannelType, EventKind, InboundEvent, SocketEnvelope};
pub use socket::SocketModeRunner;
