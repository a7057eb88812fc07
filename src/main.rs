use log::*;
use service::{config::Config, logging::Logger, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::new();
    Logger::init_logger(&config)?;

    info!(
        "Starting SSE push server ({} environment)",
        config.runtime_env()
    );
    if let Some(origin) = config.client_origin() {
        info!("Accepting stream clients from {origin}");
    }

    let app_state = AppState::new(config);
    web::init_server(app_state).await?;

    info!("SSE push server stopped");
    Ok(())
}
