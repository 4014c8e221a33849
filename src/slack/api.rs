//! Slack Web API calls used by the bot: identity lookup, socket URL, posting.

use std::time::Duration;

use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::chatbot::ReplySender;
use crate::error::{BotError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    ok: bool,
    user_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenConnectionResponse {
    ok: bool,
    url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    app_token: String,
    bot_token: String,
}

impl SlackApiClient {
    pub fn new(api_base: &str, app_token: String, bot_token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            app_token,
            bot_token,
        })
    }

    /// Returns the bot's own user id via `auth.test`.
    pub async fn resolve_bot_user_id(&self) -> Result<String> {
        let response: AuthTestResponse = self.call("auth.test", &self.bot_token, None).await?;
        ensure_ok("auth.test", response.ok, response.error)?;
        response
            .user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| BotError::SlackApi {
                method: "auth.test",
                error: "response did not include user_id".to_string(),
            })
    }

    /// Asks for a fresh Socket Mode websocket URL using the app-level token.
    pub async fn open_socket_connection(&self) -> Result<String> {
        let response: OpenConnectionResponse = self
            .call("apps.connections.open", &self.app_token, None)
            .await?;
        ensure_ok("apps.connections.open", response.ok, response.error)?;
        response
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| BotError::SlackApi {
                method: "apps.connections.open",
                error: "response did not include url".to_string(),
            })
    }

    pub async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        let body = json!({ "channel": channel, "text": text });
        let response: PostMessageResponse = self
            .call("chat.postMessage", &self.bot_token, Some(&body))
            .await?;
        ensure_ok("chat.postMessage", response.ok, response.error)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        token: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        debug!("Calling Slack API method {method}");
        let mut request = self
            .http
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

impl ReplySender for SlackApiClient {
    async fn send_reply(&self, channel: &str, text: &str) -> Result<()> {
        self.post_message(channel, text).await
    }
}

fn ensure_ok(method: &'static str, ok: bool, error: Option<String>) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(BotError::SlackApi {
            method,
            error: error.unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client(base: &str) -> SlackApiClient {
        SlackApiClient::new(base, "xapp-test".to_string(), "xoxb-test".to_string())
            .expect("client")
    }

    #[tokio::test]
    async fn resolves_bot_user_id_with_bot_token() {
        let server = MockServer::start();
        let auth = server.mock(|when, then| {
            when.method(POST)
                .path("/auth.test")
                .header("authorization", "Bearer xoxb-test");
            then.status(200)
                .json_body(json!({"ok": true, "user_id": "UBOT"}));
        });

        let id = client(&server.base_url())
            .resolve_bot_user_id()
            .await
            .expect("user id");
        assert_eq!(id, "UBOT");
        assert_eq!(auth.calls(), 1);
    }

    #[tokio::test]
    async fn opens_socket_with_app_token() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/apps.connections.open")
                .header("authorization", "Bearer xapp-test");
            then.status(200)
                .json_body(json!({"ok": true, "url": "wss://wss.slack.test/link"}));
        });

        let url = client(&server.base_url())
            .open_socket_connection()
            .await
            .expect("socket url");
        assert_eq!(url, "wss://wss.slack.test/link");
    }

    #[tokio::test]
    async fn post_message_reports_slack_error() {
        let server = MockServer::start();
        let post = server.mock(|when, then| {
            when.method(POST)
                .path("/chat.postMessage")
                .body_includes("\"channel\":\"C1\"")
                .body_includes("\"text\":\"hello\"");
            then.status(200)
                .json_body(json!({"ok": false, "error": "channel_not_found"}));
        });

        let err = client(&server.base_url())
            .post_message("C1", "hello")
            .await
            .expect_err("slack error");
        assert_eq!(
            err.to_string(),
            "Slack API error in chat.postMessage: channel_not_found"
        );
        assert_eq!(post.calls(), 1);
    }
}
