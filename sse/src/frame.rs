use axum::response::sse::Event;
use events::StreamEvent;
use log::*;

/// Serializes `event` into the data of a single unnamed SSE frame, which is
/// written as `data: <json>\n\n`. Clients consume these through the default
/// `message` handler, so no `event:` line is set.
pub fn encode(event: &StreamEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().data(json)),
        Err(e) => {
            error!("Failed to serialize {} event: {e}", event.kind());
            None
        }
    }
}
