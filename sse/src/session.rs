use crate::connection::{SessionId, SessionRegistry};
use crate::StreamSettings;
use events::{StreamEvent, StreamMode};
use log::*;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Exclusive upper bound for tick sample values.
pub const TICK_VALUE_BOUND: u32 = 1000;

/// The peer is gone; nothing more can be written to this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendError;

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream connection is closed")
    }
}

impl std::error::Error for SendError {}

/// One open stream connection.
///
/// Dropping a `Session` removes it from the registry and closes its writer,
/// so every exit path (peer disconnect, failed write, shutdown, single-shot
/// completion) runs the same cleanup, and running it again is a no-op.
pub(crate) struct Session {
    id: SessionId,
    mode: StreamMode,
    sender: UnboundedSender<StreamEvent>,
    registry: Arc<SessionRegistry>,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        mode: StreamMode,
        sender: UnboundedSender<StreamEvent>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            id,
            mode,
            sender,
            registry,
        }
    }

    pub(crate) fn write(&self, event: StreamEvent) -> Result<(), SendError> {
        trace!("Session {} <- {}", self.id.as_str(), event.kind());
        self.sender.send(event).map_err(|_| SendError)
    }

    pub(crate) fn write_tick(&self) -> Result<(), SendError> {
        let value = rand::thread_rng().gen_range(0..TICK_VALUE_BOUND);
        self.write(StreamEvent::tick(self.mode, value))
    }

    /// Drives heartbeat and tick timers until the peer disconnects, a write
    /// fails, or the server shuts down. Both timers live on this future's
    /// stack, so they are cancelled by the same return that deregisters the
    /// session.
    pub(crate) async fn run(self, settings: StreamSettings, mut shutdown: watch::Receiver<bool>) {
        if *shutdown.borrow_and_update() {
            return;
        }

        let start = Instant::now();
        let mut heartbeat = interval_at(
            start + settings.heartbeat_interval,
            settings.heartbeat_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticker = interval_at(start + settings.tick_interval, settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let written = tokio::select! {
                biased;

                _ = self.sender.closed() => {
                    debug!("Session {} closed by peer", self.id.as_str());
                    break;
                }
                _ = shutdown.changed() => {
                    debug!("Session {} closing for shutdown", self.id.as_str());
                    break;
                }
                _ = heartbeat.tick() => self.write(StreamEvent::heartbeat(self.mode)),
                _ = ticker.tick() => self.write_tick(),
            };

            if let Err(e) = written {
                warn!("Failed to write to session {}: {e}", self.id.as_str());
                break;
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.registry.unregister(&self.id) {
            info!(
                "Client disconnected ({} remaining)",
                self.registry.len()
            );
        }
    }
}
