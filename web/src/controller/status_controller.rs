use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

/// Informational body for `GET /`.
#[derive(Debug, Serialize)]
pub(crate) struct ServerStatus {
    message: &'static str,
    events: &'static str,
}

/// GET a short description of the server and where its event stream lives
pub async fn index() -> impl IntoResponse {
    Json(ServerStatus {
        message: "SSE server is running",
        events: "/events",
    })
}
