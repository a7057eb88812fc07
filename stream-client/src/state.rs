use events::{HeaderSnapshot, Payload, StreamEvent, StreamMode};

/// Maximum number of events kept in [`StreamState::history`].
pub const HISTORY_LIMIT: usize = 20;

/// Connection status as seen by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Idle,
    Connecting,
    Connected,
    /// A continuous stream failed and a reconnect is pending.
    Error,
    /// Placeholder status for renders that happen before any connection.
    Server,
}

impl StreamStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StreamStatus::Idle => "Idle",
            StreamStatus::Connecting => "Connecting…",
            StreamStatus::Connected => "Receiving updates",
            StreamStatus::Error => "Reconnecting…",
            StreamStatus::Server => "Server render",
        }
    }
}

/// Immutable snapshot of the client state.
///
/// The store never edits a published snapshot; every transition builds a new
/// one, so a snapshot obtained from `EventStore::get_snapshot` stays
/// internally consistent for as long as it is held.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamState {
    pub status: StreamStatus,
    pub last_event: Option<StreamEvent>,
    /// Most recent first, at most [`HISTORY_LIMIT`] entries.
    pub history: Vec<StreamEvent>,
    /// Header summary from the last handshake.
    pub headers: Option<HeaderSnapshot>,
    pub with_credentials: bool,
    pub mode: StreamMode,
}

impl StreamState {
    /// Empty, disconnected state.
    pub fn idle(mode: StreamMode, with_credentials: bool) -> Self {
        Self {
            status: StreamStatus::Idle,
            last_event: None,
            history: Vec::new(),
            headers: None,
            with_credentials,
            mode,
        }
    }

    /// Neutral state for renders that happen before streaming starts.
    pub fn server(with_credentials: bool) -> Self {
        Self {
            status: StreamStatus::Server,
            ..Self::idle(StreamMode::default(), with_credentials)
        }
    }

    pub(crate) fn with_status(&self, status: StreamStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Folds an accepted event into a new snapshot.
    pub(crate) fn apply(&self, event: StreamEvent) -> Self {
        let mut history = Vec::with_capacity(HISTORY_LIMIT);
        history.push(event.clone());
        history.extend(self.history.iter().take(HISTORY_LIMIT - 1).cloned());

        let (headers, with_credentials) = match &event.payload {
            Payload::Handshake {
                headers,
                with_credentials,
            } => (Some(headers.clone()), *with_credentials),
            _ => (self.headers.clone(), self.with_credentials),
        };

        // The server decides the effective mode of a live session.
        let mode = event.mode.unwrap_or(self.mode);

        Self {
            status: StreamStatus::Connected,
            last_event: Some(event),
            history,
            headers,
            with_credentials,
            mode,
        }
    }

    pub fn last_value(&self) -> Option<u32> {
        self.last_event.as_ref().and_then(StreamEvent::value)
    }

    pub fn last_heartbeat(&self) -> Option<&StreamEvent> {
        self.history
            .iter()
            .find(|event| matches!(event.payload, Payload::Heartbeat))
    }
}
