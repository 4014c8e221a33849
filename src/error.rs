use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OpenAI API error ({status}): {message}")]
    OpenAiApi {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("OpenAI response error: {0}")]
    OpenAiResponse(String),

    #[error("Slack API error in {method}: {error}")]
    SlackApi { method: &'static str, error: String },

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for BotError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        BotError::WebSocket(Box::new(err))
    }
}

impl BotError {
    /// Returns a user-friendly error message suitable for posting back to Slack
    pub fn user_message(&self) -> String {
        match self {
            BotError::MissingEnv(_) | BotError::Config(_) => {
                "Sorry, there's a configuration issue on my end. Please contact the bot administrator.".to_string()
            }
            BotError::OpenAiApi { status, message } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    "Sorry, I'm having authentication issues with my AI service. Please contact the bot administrator.".to_string()
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    "Sorry, I've hit my rate limit. Please try again in a few moments.".to_string()
                }
                status if status.is_server_error() => {
                    "Sorry, the AI service is experiencing issues right now. Please try again later.".to_string()
                }
                status if status.is_client_error() => {
                    format!("The AI service rejected my request ({status}): {message}")
                }
                _ => {
                    "Sorry, I'm having trouble connecting to my AI service. Please try again later.".to_string()
                }
            },
            BotError::OpenAiResponse(_) | BotError::Json(_) => {
                "Sorry, I received an unexpected response from my AI service. Please try again.".to_string()
            }
            BotError::Reqwest(e) if e.is_timeout() => {
                "Sorry, my AI service took too long to answer. Please try again.".to_string()
            }
            BotError::Reqwest(_) | BotError::WebSocket(_) | BotError::Io(_) => {
                "Sorry, I'm having network issues. Please try again in a moment.".to_string()
            }
            BotError::SlackApi { .. } => {
                "Sorry, I'm having trouble communicating with Slack right now. Please try again later.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_maps_to_retry_hint() {
        let err = BotError::OpenAiApi {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".to_string(),
        };
        assert!(err.user_message().contains("rate limit"));
    }

    #[test]
    fn client_error_includes_provider_message() {
        let err = BotError::OpenAiApi {
            status: StatusCode::BAD_REQUEST,
            message: "unknown model".to_string(),
        };
        assert!(err.user_message().contains("unknown model"));
    }

    #[test]
    fn missing_env_names_variable() {
        let err = BotError::MissingEnv("SLACK_BOT_TOKEN");
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: SLACK_BOT_TOKEN"
        );
    }
}
