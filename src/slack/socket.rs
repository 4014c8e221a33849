//! Socket Mode session loop: receive envelopes, ack them, route events one at a time.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::json;
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::chatbot::EventRouter;
use crate::error::Result;
use crate::shutdown::shutdown_requested;

use super::api::SlackApiClient;
use super::event::SocketEnvelope;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

enum SessionEnd {
    Reconnect,
    Shutdown,
}

/// Drives the Slack event transport until Ctrl-C.
///
/// Each event is fully handled (reply generated and sent) before the next
/// frame is read, so the router never sees two events at once.
pub struct SocketModeRunner {
    client: SlackApiClient,
    router: EventRouter<SlackApiClient>,
    shutdown: watch::Receiver<bool>,
}

impl SocketModeRunner {
    pub fn new(
        client: SlackApiClient,
        router: EventRouter<SlackApiClient>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            router,
            shutdown,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.client.open_socket_connection().await {
                Ok(url) => {
                    info!("Connecting to Slack Socket Mode");
                    match self.run_session(&url).await {
                        Ok(SessionEnd::Shutdown) => return Ok(()),
                        Ok(SessionEnd::Reconnect) => info!("Slack closed the socket, reconnecting"),
                        Err(e) => warn!("Socket Mode session error: {e}"),
                    }
                }
                Err(e) => error!("Failed to open Socket Mode connection: {e}"),
            }

            tokio::select! {
                () = shutdown_requested(&mut self.shutdown) => return Ok(()),
                () = tokio::time::sleep(RECONNECT_DELAY) => {}
            }
        }
    }

    async fn run_session(&mut self, url: &str) -> Result<SessionEnd> {
        let (stream, _response) = connect_async(url).await?;
        let (mut sink, mut source) = stream.split();

        loop {
            let message = tokio::select! {
                () = shutdown_requested(&mut self.shutdown) => return Ok(SessionEnd::Shutdown),
                next = source.next() => match next {
                    Some(message) => message?,
                    None => return Ok(SessionEnd::Reconnect),
                },
            };

            if let WsMessage::Close(_) = message {
                return Ok(SessionEnd::Reconnect);
            }
            let Some(text) = frame_text(message) else {
                continue;
            };

            let envelope = match SocketEnvelope::parse(&text) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!("Failed to parse socket envelope: {e}");
                    continue;
                }
            };

            // Slack redelivers anything not acked within a few seconds.
            if let Some(ack) = ack_frame(&envelope) {
                sink.send(ack).await?;
            }

            if envelope.is_disconnect() {
                return Ok(SessionEnd::Reconnect);
            }

            match envelope.inbound_event() {
                Ok(Some(event)) => {
                    self.router.handle_inbound(&event).await;
                }
                Ok(None) => debug!("Skipping {} envelope", envelope.envelope_type),
                Err(e) => warn!("Failed to decode event payload: {e}"),
            }
        }
    }
}

/// Text payload of a data frame; control frames and invalid UTF-8 yield `None`.
fn frame_text(message: WsMessage) -> Option<String> {
    match message {
        WsMessage::Text(text) => Some(text.as_str().to_string()),
        WsMessage::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Dropping non UTF-8 socket frame: {e}");
                None
            }
        },
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Close(_) | WsMessage::Frame(_) => {
            None
        }
    }
}

fn ack_frame(envelope: &SocketEnvelope) -> Option<WsMessage> {
    let envelope_id = envelope.envelope_id.as_ref()?;
    let ack = json!({ "envelope_id": envelope_id }).to_string();
    Some(WsMessage::Text(ack.into()))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn frame_text_decodes_text_and_binary() {
        let raw = r#"{"envelope_id":"env-1","type":"events_api","payload":{}}"#;

        assert_eq!(
            frame_text(WsMessage::Text(raw.to_string().into())).as_deref(),
            Some(raw)
        );
        assert_eq!(
            frame_text(WsMessage::Binary(raw.as_bytes().to_vec().into())).as_deref(),
            Some(raw)
        );
    }

    #[test]
    fn frame_text_skips_invalid_utf8_and_control_frames() {
        assert_eq!(frame_text(WsMessage::Binary(vec![0xff, 0xfe].into())), None);
        assert_eq!(frame_text(WsMessage::Ping(Vec::<u8>::new().into())), None);
        assert_eq!(frame_text(WsMessage::Pong(Vec::<u8>::new().into())), None);
        assert_eq!(frame_text(WsMessage::Close(None)), None);
    }

    #[test]
    fn envelopes_with_id_are_acked() {
        let envelope = SocketEnvelope::parse(
            r#"{"envelope_id":"env-7","type":"events_api","payload":{}}"#,
        )
        .expect("envelope");

        let Some(WsMessage::Text(ack)) = ack_frame(&envelope) else {
            panic!("expected a text ack frame");
        };
        let ack: Value = serde_json::from_str(ack.as_str()).expect("ack json");
        assert_eq!(ack, json!({ "envelope_id": "env-7" }));
    }

    #[test]
    fn hello_is_not_acked() {
        let envelope =
            SocketEnvelope::parse(r#"{"type":"hello","num_connections":1}"#).expect("hello");
        assert!(ack_frame(&envelope).is_none());
    }

    #[test]
    fn disconnect_is_acked_and_ends_the_session() {
        let frame = WsMessage::Text(
            r#"{"envelope_id":"env-9","type":"disconnect","reason":"refresh_requested"}"#
                .to_string()
                .into(),
        );
        let text = frame_text(frame).expect("text frame");
        let envelope = SocketEnvelope::parse(&text).expect("envelope");

        assert!(ack_frame(&envelope).is_some());
        assert!(envelope.is_disconnect());
        assert!(envelope.inbound_event().expect("decode").is_none());
    }
}
