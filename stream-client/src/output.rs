use crate::state::{StreamState, StreamStatus};
use chrono::{DateTime, Local};
use colored::*;
use events::{CookiePresence, Payload, StreamEvent, StreamMode};

/// Placeholder for values that have not been received yet.
pub const MISSING: &str = "—";

pub fn mode_label(mode: StreamMode) -> &'static str {
    match mode {
        StreamMode::Continuous => "Stream endlessly",
        StreamMode::Single => "Stop after one tick",
    }
}

/// Local wall-clock time of an ISO-8601 timestamp.
pub fn format_time(at: Option<&str>) -> String {
    at.and_then(|at| DateTime::parse_from_rfc3339(at).ok())
        .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn status_colored(status: StreamStatus) -> ColoredString {
    let label = status.label();
    match status {
        StreamStatus::Connected => label.green(),
        StreamStatus::Connecting => label.yellow(),
        StreamStatus::Error => label.red(),
        StreamStatus::Idle | StreamStatus::Server => label.dimmed(),
    }
}

fn describe(event: &StreamEvent) -> String {
    match &event.payload {
        Payload::Handshake {
            with_credentials, ..
        } => format!("handshake (withCredentials: {with_credentials})"),
        Payload::Heartbeat => "heartbeat".to_string(),
        Payload::Tick { value } => format!("tick {value}"),
        Payload::Other { kind } => kind.clone(),
    }
}

pub fn print_snapshot(state: &StreamState) {
    println!(
        "\n[{}] {} ({})",
        status_colored(state.status).bold(),
        mode_label(state.mode).cyan(),
        state.mode
    );

    let value = state
        .last_value()
        .map(|value| value.to_string())
        .unwrap_or_else(|| MISSING.to_string());
    println!(
        "   latest value: {}   at {}",
        value.bright_white().bold(),
        format_time(state.last_event.as_ref().map(|event| event.at.as_str()))
    );
    println!(
        "   last heartbeat: {}",
        format_time(state.last_heartbeat().map(|event| event.at.as_str()))
    );
    println!("   withCredentials: {}", state.with_credentials);

    if let Some(headers) = &state.headers {
        let cookie = match headers.cookie {
            CookiePresence::Present => "present".green(),
            CookiePresence::Absent => "absent".dimmed(),
        };
        println!(
            "   origin: {}   cookie: {}",
            headers.origin.as_deref().unwrap_or(MISSING),
            cookie
        );
        println!(
            "   user-agent: {}",
            headers.user_agent.as_deref().unwrap_or(MISSING).dimmed()
        );
    }

    for event in &state.history {
        println!(
            "   {} {}",
            format_time(Some(&event.at)).dimmed(),
            describe(event)
        );
    }
}
