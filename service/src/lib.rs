use config::Config;
use log::info;
use sse::Manager;
use std::sync::Arc;

pub mod config;
pub mod logging;

// Service-level state shared by every request handler.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sse_manager: Arc<Manager>,
}

impl AppState {
    pub fn new(app_config: Config) -> Self {
        let settings = app_config.stream_settings();
        info!(
            "Stream settings: heartbeat={}ms, tick={}ms, with_credentials={}",
            settings.heartbeat_interval.as_millis(),
            settings.tick_interval.as_millis(),
            settings.with_credentials,
        );

        Self {
            sse_manager: Arc::new(Manager::new(settings)),
            config: app_config,
        }
    }
}
