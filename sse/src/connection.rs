use chrono::{DateTime, Utc};
use dashmap::DashMap;
use events::StreamMode;
use log::*;

/// Unique identifier for a stream session (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// What the registry knows about a live session. The writable half of the
/// connection and the timers belong to the session task itself.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub mode: StreamMode,
    pub opened_at: DateTime<Utc>,
}

/// Membership set of open sessions.
///
/// Sessions open and close on independent tasks, so inserts and removals go
/// through a `DashMap` and never contend on a single lock.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionInfo>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a new session - O(1)
    pub fn register(&self, mode: StreamMode) -> SessionId {
        let session_id = SessionId::new();

        self.sessions.insert(
            session_id.clone(),
            SessionInfo {
                mode,
                opened_at: Utc::now(),
            },
        );

        trace!("Registered {mode} session {}", session_id.as_str());
        session_id
    }

    /// Unregister a session - O(1). Returns `false` when the session was
    /// already gone, which makes repeated cleanup harmless.
    pub fn unregister(&self, session_id: &SessionId) -> bool {
        match self.sessions.remove(session_id) {
            Some((_, info)) => {
                let open_for = Utc::now() - info.opened_at;
                trace!(
                    "Unregistered {} session {} after {}ms",
                    info.mode,
                    session_id.as_str(),
                    open_for.num_milliseconds()
                );
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
