#[tokio::main]
async fn main() -> warpi::error::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warpi=info"))
        .init();
    log::info!("Starting Warpi Slack bot");

    // The Socket Mode websocket uses rustls without a built-in provider.
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        log::debug!("A rustls crypto provider was already installed");
    }

    match warpi::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {e}");
            Err(e)
        }
    }
}
