use anyhow::Result;
use genstudio_api::setup;
use genstudio_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let (state, app) = setup::initialize_app(config).await?;

    setup::server::start_server(&state.config, app).await
}
