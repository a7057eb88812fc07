use crate::{controller::status_controller, sse::handler::events_handler, AppState};
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use log::*;
use service::config::Config;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);

    Router::new()
        .merge(status_routes())
        .merge(event_stream_routes(app_state))
        .layer(cors)
}

/// Only GET is exposed, and only to the configured client origins.
/// Credentials are allowed when the server is configured for them, which also
/// adds `Access-Control-Allow-Credentials: true` to every stream response.
///
/// A `*` origin allows any origin, but only without credentials; credentialed
/// CORS cannot use a wildcard, so there it is dropped and only the explicit
/// origins remain.
fn cors_layer(config: &Config) -> CorsLayer {
    let wildcard = config
        .allowed_origins
        .iter()
        .any(|origin| origin.trim() == "*");

    let allow_origin = if wildcard && !config.with_credentials {
        AllowOrigin::any()
    } else {
        if wildcard {
            warn!("Ignoring allowed origin \"*\": credentials require explicit origins");
        }
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter(|origin| origin.trim() != "*")
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring invalid allowed origin {origin:?}: {e}");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .allow_credentials(config.with_credentials)
}

fn status_routes() -> Router {
    Router::new().route("/", get(status_controller::index))
}

fn event_stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events", get(events_handler))
        .with_state(app_state)
}
