use crate::AppState;
use async_stream::stream;
use axum::extract::{RawQuery, State};
use axum::http::header::{ACCEPT, CONNECTION, COOKIE, ORIGIN, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use events::{CookiePresence, HeaderSnapshot, StreamMode};
use log::*;
use std::convert::Infallible;

/// SSE handler for `GET /events?mode={continuous|single}`.
///
/// Opens a session in the resolved mode and streams its events as they are
/// queued. When the client goes away the stream is dropped, which drops the
/// session's receiver and lets the session clean itself up.
pub(crate) async fn events_handler(
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    let mode = StreamMode::from_query(mode_param(query.as_deref()).as_deref());
    let snapshot = summarize_headers(&headers);
    debug!(
        "Establishing {mode} stream for origin {:?}",
        snapshot.origin
    );

    let mut rx = app_state.sse_manager.open_session(mode, snapshot);

    let stream = stream! {
        while let Some(event) = rx.recv().await {
            if let Some(frame) = ::sse::frame::encode(&event) {
                yield Ok::<Event, Infallible>(frame);
            }
        }
        debug!("{mode} stream finished");
    };

    (
        [(CONNECTION, HeaderValue::from_static("keep-alive"))],
        Sse::new(stream),
    )
}

/// First `mode` value in the raw query string, if any. Decoding never fails;
/// malformed pairs are simply skipped by the form decoder.
fn mode_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "mode")
        .map(|(_, value)| value.into_owned())
}

fn summarize_headers(headers: &HeaderMap) -> HeaderSnapshot {
    let cookie = match headers.get(COOKIE) {
        Some(value) if !value.is_empty() => CookiePresence::Present,
        _ => CookiePresence::Absent,
    };

    HeaderSnapshot {
        origin: header_text(headers, ORIGIN),
        cookie,
        user_agent: header_text(headers, USER_AGENT),
        accept: header_text(headers, ACCEPT),
    }
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
