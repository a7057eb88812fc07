//! HTTP surface of the push server: the `/events` stream, the informational
//! `/` route, CORS, and the serve loop with graceful shutdown.

use log::*;
use ::sse::Manager;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use service::AppState;

mod controller;
pub mod router;
mod sse;

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let addr = format!(
        "{}:{}",
        app_state.config.interface(),
        app_state.config.port
    );
    let listener = TcpListener::bind(&addr).await?;
    info!("SSE server listening on http://{addr}");

    let manager = Arc::clone(&app_state.sse_manager);
    let router = router::define_routes(app_state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(manager))
        .await
}

/// Resolves on Ctrl-C after telling every open stream to close, so the
/// graceful shutdown is not held up by long-lived connections.
async fn shutdown_signal(manager: Arc<Manager>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {e}");
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received");
    manager.shutdown();
}
