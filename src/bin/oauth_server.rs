#[tokio::main]
async fn main() -> warpi::error::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warpi=info"))
        .init();
    log::info!("Starting Warpi OAuth install server");

    warpi::oauth::serve().await.inspect_err(|e| {
        log::error!("OAuth server encountered an error: {e}");
    })
}
