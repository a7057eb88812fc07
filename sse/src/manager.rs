use crate::connection::SessionRegistry;
use crate::session::Session;
use crate::StreamSettings;
use events::{HeaderSnapshot, StreamEvent, StreamMode};
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::watch;

pub struct Manager {
    registry: Arc<SessionRegistry>,
    settings: StreamSettings,
    shutdown: watch::Sender<bool>,
}

impl Manager {
    pub fn new(settings: StreamSettings) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            registry: Arc::new(SessionRegistry::new()),
            settings,
            shutdown,
        }
    }

    /// Open a session and return the receiving end of its event stream.
    ///
    /// The handshake is queued before this returns. A single-mode session also
    /// queues its one tick and is already closed and deregistered by then; a
    /// continuous session keeps writing from a spawned task until the receiver
    /// is dropped or [`Manager::shutdown`] is called. Must be called from
    /// within a Tokio runtime.
    pub fn open_session(
        &self,
        mode: StreamMode,
        headers: HeaderSnapshot,
    ) -> UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        let session_id = self.registry.register(mode);
        info!(
            "Client connected in {mode} mode ({} total)",
            self.registry.len()
        );

        let session = Session::new(session_id, mode, tx, Arc::clone(&self.registry));
        let handshake = StreamEvent::handshake(mode, headers, self.settings.with_credentials);
        if session.write(handshake).is_err() {
            return rx;
        }

        match mode {
            StreamMode::Single => {
                if let Err(e) = session.write_tick() {
                    warn!("Failed to write single-shot tick: {e}");
                }
                // Dropping the session here closes the stream after the tick.
            }
            StreamMode::Continuous => {
                tokio::spawn(session.run(self.settings.clone(), self.shutdown.subscribe()));
            }
        }

        rx
    }

    /// Number of sessions currently registered
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Ask every open session to close. Sessions opened afterwards still get
    /// their handshake and are closed right after it.
    pub fn shutdown(&self) {
        info!(
            "Shutting down {} open stream session(s)",
            self.registry.len()
        );
        self.shutdown.send_replace(true);
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(StreamSettings::default())
    }
}
