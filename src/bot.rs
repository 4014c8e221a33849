//! Slack bot wiring: configuration, identity lookup and the event loop.

use log::{debug, info};

use crate::chatbot::{EventRouter, ReplyGenerator};
use crate::config::Config;
use crate::error::Result;
use crate::memory::ConversationStore;
use crate::shutdown::shutdown_signal;
use crate::slack::{SlackApiClient, SocketModeRunner};

/// Run the Slack bot.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;

    debug!("Building reply generator");
    let generator = ReplyGenerator::from_config(&config.reply_mode)?;

    let slack = SlackApiClient::new(
        &config.slack_api_base,
        config.slack_app_token,
        config.slack_bot_token,
    )?;

    debug!("Resolving bot identity");
    let bot_user_id = slack.resolve_bot_user_id().await?;
    info!("Bot user id is {bot_user_id}");

    let router = EventRouter::new(
        ConversationStore::new(),
        generator,
        slack.clone(),
        &bot_user_id,
    );

    info!(
        "Warpi bot running in {} mode (Ctrl+C to stop)",
        config.reply_mode.mode()
    );
    SocketModeRunner::new(slack, router, shutdown_signal())
        .run()
        .await
}
