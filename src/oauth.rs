//! One-time OAuth install flow: redirect to Slack, then exchange the code for a token.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{Query, State},
    response::Redirect,
    routing::get,
};
use log::{error, info};
use serde::Deserialize;
use tokio::net::TcpListener;
use url::Url;

use crate::config::OAuthConfig;
use crate::error::{BotError, Result};
use crate::shutdown::{shutdown_requested, shutdown_signal};

const AUTHORIZE_URL: &str = "https://slack.com/oauth/v2/authorize";
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

pub const INSTALL_PATH: &str = "/slack/install";
pub const REDIRECT_PATH: &str = "/slack/oauth_redirect";

pub struct OAuthState {
    config: OAuthConfig,
    authorize_url: String,
    http: reqwest::Client,
}

impl OAuthState {
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let authorize_url = Url::parse_with_params(
            AUTHORIZE_URL,
            [
                ("client_id", config.client_id.as_str()),
                ("scope", config.scopes.as_str()),
                ("redirect_uri", config.redirect_uri.as_str()),
            ],
        )
        .map_err(|e| BotError::Config(format!("Invalid OAuth authorize URL: {e}")))?
        .to_string();
        let http = reqwest::Client::builder()
            .timeout(EXCHANGE_TIMEOUT)
            .build()?;

        Ok(Self {
            config,
            authorize_url,
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RedirectParams {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthAccessResponse {
    ok: bool,
    access_token: Option<String>,
    team: Option<Team>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Team {
    name: Option<String>,
}

pub fn router(state: Arc<OAuthState>) -> Router {
    Router::new()
        .route(INSTALL_PATH, get(install))
        .route(REDIRECT_PATH, get(oauth_redirect))
        .with_state(state)
}

/// Run the install server until Ctrl-C.
pub async fn serve() -> Result<()> {
    let config = OAuthConfig::from_env()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(OAuthState::new(config)?);

    let listener = TcpListener::bind(addr).await?;
    info!("OAuth install server listening on http://{addr}{INSTALL_PATH}");

    let mut shutdown = shutdown_signal();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown_requested(&mut shutdown).await })
        .await?;
    Ok(())
}

async fn install(State(state): State<Arc<OAuthState>>) -> Redirect {
    info!("Redirecting installer to Slack authorization page");
    Redirect::to(&state.authorize_url)
}

async fn oauth_redirect(
    State(state): State<Arc<OAuthState>>,
    Query(params): Query<RedirectParams>,
) -> String {
    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        return "Missing 'code' parameter in redirect.".to_string();
    };
    exchange_code(&state, &code).await
}

async fn exchange_code(state: &OAuthState, code: &str) -> String {
    let config = &state.config;
    let url = format!(
        "{}/oauth.v2.access",
        config.slack_api_base.trim_end_matches('/')
    );
    let form = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("redirect_uri", config.redirect_uri.as_str()),
    ];

    let access: OAuthAccessResponse = match state.http.post(url).form(&form).send().await {
        Ok(response) => match response.json().await {
            Ok(access) => access,
            Err(e) => {
                error!("Unreadable oauth.v2.access response: {e}");
                return format!("Network error: {e}");
            }
        },
        Err(e) => {
            error!("oauth.v2.access request failed: {e}");
            return format!("Network error: {e}");
        }
    };

    if access.ok {
        let team_name = access
            .team
            .and_then(|team| team.name)
            .unwrap_or_else(|| "Unknown Team".to_string());
        info!("App installed on workspace '{team_name}'");
        format!(
            "App installed successfully on '{team_name}'!\nAccess token: {}",
            access.access_token.unwrap_or_default()
        )
    } else {
        let error = access.error.unwrap_or_else(|| "Unknown error".to_string());
        error!("oauth.v2.access returned error: {error}");
        format!("Slack API Error: {error}")
    }
}
