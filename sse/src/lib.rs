//! Server-Sent Events (SSE) session management.
//!
//! This crate owns the server half of the push stream: it registers every
//! inbound stream connection as a session, writes the session's events, and
//! deregisters it when the connection goes away.
//!
//! # Architecture
//!
//! - **One session per connection**: each `GET /events` opens a session with
//!   its own mode and its own timers. Sessions never talk to each other.
//! - **Membership registry**: the only shared state is the `SessionRegistry`,
//!   a `DashMap` keyed by server-generated `SessionId`.
//! - **Task-owned timers**: a continuous session runs on its own task, which
//!   owns both interval timers. Ending the task cancels them, so a timer can
//!   never fire for a deregistered session.
//! - **Drop-based cleanup**: deregistration happens when the session value is
//!   dropped, so peer disconnects, failed writes, shutdown and single-shot
//!   completion all share one idempotent cleanup path.
//! - **At-most-once delivery**: a failed write ends the session; nothing is
//!   retried or buffered for later.
//!
//! # Session lifecycle
//!
//! 1. The web layer calls `Manager::open_session` with the resolved mode and
//!    the request header summary.
//! 2. A handshake event is queued immediately.
//! 3. `single`: one tick is queued and the session closes.
//!    `continuous`: heartbeat and tick timers run until the peer disconnects,
//!    a write fails, or `Manager::shutdown` is called.
//! 4. The web layer turns each event into one `data: <json>` frame.
//!
//! # Modules
//!
//! - `connection`: `SessionRegistry` and the type-safe `SessionId`
//! - `manager`: opens sessions and signals shutdown
//! - `frame`: event to SSE frame encoding

pub mod connection;
pub mod frame;
pub mod manager;
mod session;

pub use manager::Manager;
pub use session::{SendError, TICK_VALUE_BOUND};

use std::time::Duration;

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(3);

/// Fixed stream settings every session is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub heartbeat_interval: Duration,
    pub tick_interval: Duration,
    /// Echoed in every handshake.
    pub with_credentials: bool,
}

impl StreamSettings {
    /// Intervals are clamped to at least one millisecond.
    pub fn new(heartbeat_interval: Duration, tick_interval: Duration, with_credentials: bool) -> Self {
        let floor = Duration::from_millis(1);
        Self {
            heartbeat_interval: heartbeat_interval.max(floor),
            tick_interval: tick_interval.max(floor),
            with_credentials,
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_TICK_INTERVAL, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = StreamSettings::default();
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(settings.tick_interval, Duration::from_secs(3));
        assert!(settings.with_credentials);
    }

    #[test]
    fn test_zero_intervals_are_clamped() {
        let settings = StreamSettings::new(Duration::ZERO, Duration::ZERO, false);
        assert_eq!(settings.heartbeat_interval, Duration::from_millis(1));
        assert_eq!(settings.tick_interval, Duration::from_millis(1));
    }
}
