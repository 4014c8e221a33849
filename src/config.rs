use std::{env, time::Duration};

use log::{debug, error, info};
use strum::{Display, EnumString};

use crate::error::{BotError, Result};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_SLACK_SCOPES: &str = "app_mentions:read,chat:write";
const DEFAULT_OPENAI_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OAUTH_PORT: u16 = 5000;

/// Operating mode selected by `BOT_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BotMode {
    /// Echo the user's text back without any network call
    Dummy,
    /// Ask the OpenAI chat completion endpoint
    OpenAi,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum ReplyModeConfig {
    Dummy,
    OpenAi(OpenAiSettings),
}

impl ReplyModeConfig {
    pub fn mode(&self) -> BotMode {
        match self {
            ReplyModeConfig::Dummy => BotMode::Dummy,
            ReplyModeConfig::OpenAi(_) => BotMode::OpenAi,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub slack_bot_token: String,
    pub slack_app_token: String,
    pub slack_api_base: String,
    pub reply_mode: ReplyModeConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let slack_bot_token = vars.required("SLACK_BOT_TOKEN")?;
        let slack_app_token = vars.required("SLACK_APP_TOKEN")?;
        let slack_api_base = vars.or("SLACK_API_BASE", DEFAULT_SLACK_API_BASE);

        let raw_mode = vars.or("BOT_MODE", "dummy");
        let mode: BotMode = raw_mode.parse().map_err(|_| {
            error!("Unsupported BOT_MODE value: {raw_mode}");
            BotError::Config(format!(
                "BOT_MODE must be \"dummy\" or \"openai\", got \"{raw_mode}\""
            ))
        })?;

        let reply_mode = match mode {
            BotMode::Dummy => ReplyModeConfig::Dummy,
            BotMode::OpenAi => {
                let Some(api_key) = vars.get("OPENAI_API_KEY") else {
                    error!("BOT_MODE=openai but OPENAI_API_KEY is not set");
                    return Err(BotError::Config(
                        "BOT_MODE=openai requires OPENAI_API_KEY".to_string(),
                    ));
                };
                let timeout_secs = match vars.get("OPENAI_TIMEOUT_SECS") {
                    Some(raw) => raw.parse::<u64>().map_err(|e| {
                        BotError::Config(format!("OPENAI_TIMEOUT_SECS is not a number: {e}"))
                    })?,
                    None => DEFAULT_OPENAI_TIMEOUT_SECS,
                };
                ReplyModeConfig::OpenAi(OpenAiSettings {
                    api_key,
                    model: vars.or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
                    api_base: vars.or("OPENAI_API_BASE", DEFAULT_OPENAI_API_BASE),
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
        };

        info!("Configuration loaded successfully, running in {mode} mode");
        debug!("Slack bot token length: {} characters", slack_bot_token.len());
        debug!("Slack app token length: {} characters", slack_app_token.len());
        if let ReplyModeConfig::OpenAi(settings) = &reply_mode {
            debug!("OpenAI API key length: {} characters", settings.api_key.len());
            debug!("OpenAI model: {}", settings.model);
        }

        Ok(Self {
            slack_bot_token,
            slack_app_token,
            slack_api_base,
            reply_mode,
        })
    }
}

/// Settings for the OAuth install server.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: String,
    pub slack_api_base: String,
    pub port: u16,
}

impl OAuthConfig {
    pub fn from_env() -> Result<Self> {
        debug!("Loading OAuth configuration from environment");
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let client_id = vars.required("SLACK_CLIENT_ID")?;
        let client_secret = vars.required("SLACK_CLIENT_SECRET")?;
        let redirect_uri = vars.required("SLACK_OAUTH_REDIRECT")?;
        let port = match vars.get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| BotError::Config(format!("PORT is not a valid port: {e}")))?,
            None => DEFAULT_OAUTH_PORT,
        };

        info!("OAuth configuration loaded successfully");

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            scopes: vars.or("SLACK_SCOPES", DEFAULT_SLACK_SCOPES),
            slack_api_base: vars.or("SLACK_API_BASE", DEFAULT_SLACK_API_BASE),
            port,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    // Blank values count as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String> {
        self.get(key).ok_or_else(|| {
            error!("Failed to load {key} from environment");
            BotError::MissingEnv(key)
        })
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const SLACK: [(&str, &str); 2] = [
        ("SLACK_BOT_TOKEN", "xoxb-test"),
        ("SLACK_APP_TOKEN", "xapp-test"),
    ];

    #[test]
    fn defaults_to_dummy_mode() {
        let config = Config::from_lookup(lookup(&SLACK)).expect("config");
        assert_eq!(config.reply_mode.mode(), BotMode::Dummy);
        assert_eq!(config.slack_api_base, DEFAULT_SLACK_API_BASE);
    }

    #[test]
    fn missing_bot_token_is_fatal() {
        let err = Config::from_lookup(lookup(&[("SLACK_APP_TOKEN", "xapp-test")]))
            .expect_err("missing token");
        assert!(matches!(err, BotError::MissingEnv("SLACK_BOT_TOKEN")));
    }

    #[test]
    fn blank_app_token_is_fatal() {
        let err = Config::from_lookup(lookup(&[
            ("SLACK_BOT_TOKEN", "xoxb-test"),
            ("SLACK_APP_TOKEN", "  "),
        ]))
        .expect_err("blank token");
        assert!(matches!(err, BotError::MissingEnv("SLACK_APP_TOKEN")));
    }

    #[test]
    fn openai_mode_without_key_fails_fast() {
        let mut pairs = SLACK.to_vec();
        pairs.push(("BOT_MODE", "openai"));
        let err = Config::from_lookup(lookup(&pairs)).expect_err("missing api key");
        assert!(matches!(err, BotError::Config(_)));
    }

    #[test]
    fn openai_mode_uses_default_model() {
        let mut pairs = SLACK.to_vec();
        pairs.push(("BOT_MODE", "OpenAI"));
        pairs.push(("OPENAI_API_KEY", "sk-test"));
        let config = Config::from_lookup(lookup(&pairs)).expect("config");
        let ReplyModeConfig::OpenAi(settings) = config.reply_mode else {
            panic!("expected openai mode");
        };
        assert_eq!(settings.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(settings.api_base, DEFAULT_OPENAI_API_BASE);
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let mut pairs = SLACK.to_vec();
        pairs.push(("BOT_MODE", "anthropic"));
        let err = Config::from_lookup(lookup(&pairs)).expect_err("bad mode");
        assert!(err.to_string().contains("anthropic"));
    }

    #[test]
    fn oauth_config_defaults_scopes_and_port() {
        let config = OAuthConfig::from_lookup(lookup(&[
            ("SLACK_CLIENT_ID", "123.456"),
            ("SLACK_CLIENT_SECRET", "shh"),
            ("SLACK_OAUTH_REDIRECT", "https://example.com/slack/oauth_redirect"),
        ]))
        .expect("oauth config");
        assert_eq!(config.scopes, DEFAULT_SLACK_SCOPES);
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn oauth_config_requires_redirect() {
        let err = OAuthConfig::from_lookup(lookup(&[
            ("SLACK_CLIENT_ID", "123.456"),
            ("SLACK_CLIENT_SECRET", "shh"),
        ]))
        .expect_err("missing redirect");
        assert!(matches!(err, BotError::MissingEnv("SLACK_OAUTH_REDIRECT")));
    }
}
