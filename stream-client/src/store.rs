//! The client-side event store.
//!
//! `EventStore` owns one subscription to the stream, folds every accepted
//! frame into a [`StreamState`] snapshot and tells its listeners whenever a
//! new snapshot is published. Listeners get no arguments; they pull the
//! current snapshot with [`EventStore::get_snapshot`].
//!
//! Every transition goes through [`Inner::publish`], which swaps in a new
//! `Arc<StreamState>`. Listeners run synchronously after the lock is
//! released, so they are free to call back into the store.
//!
//! Each connection gets a generation number. Events from a transport that was
//! closed or replaced carry a stale generation and are dropped, and a pending
//! reconnect is identified by its own token, so neither can act after it has
//! been cancelled.

use crate::config::StoreConfig;
use crate::state::{StreamState, StreamStatus};
use crate::transport::{Transport, TransportEvent};
use events::{StreamEvent, StreamMode};
use futures_util::stream::{BoxStream, StreamExt};
use log::*;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle to the store. Clones share the same state.
#[derive(Clone)]
pub struct EventStore {
    shared: Arc<Shared>,
}

struct Shared {
    config: StoreConfig,
    transport: Arc<dyn Transport>,
    server_snapshot: Arc<StreamState>,
    inner: Mutex<Inner>,
}

struct Inner {
    state: Arc<StreamState>,
    listeners: BTreeMap<u64, Listener>,
    next_listener_id: u64,
    connection: Option<Connection>,
    reconnect: Option<PendingReconnect>,
    next_generation: u64,
}

struct Connection {
    generation: u64,
    pump: JoinHandle<()>,
}

struct PendingReconnect {
    token: u64,
    timer: JoinHandle<()>,
}

impl Inner {
    /// Replaces the snapshot and returns the listeners to notify.
    fn publish(&mut self, next: StreamState) -> Vec<Listener> {
        trace!("Store status -> {:?}", next.status);
        self.state = Arc::new(next);
        self.listeners.values().cloned().collect()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| connection.generation == generation)
    }

    fn close_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.pump.abort();
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some(pending) = self.reconnect.take() {
            pending.timer.abort();
        }
    }

    fn teardown(&mut self) {
        self.close_connection();
        self.cancel_reconnect();
    }

    fn take_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

fn notify(listeners: Vec<Listener>) {
    for listener in listeners {
        listener();
    }
}

impl EventStore {
    /// Creates an idle store. Nothing connects until the first subscriber.
    pub fn new(config: StoreConfig, transport: Arc<dyn Transport>) -> Self {
        let state = StreamState::idle(config.initial_mode, config.with_credentials);
        let server_snapshot = Arc::new(StreamState::server(config.with_credentials));

        Self {
            shared: Arc::new(Shared {
                config,
                transport,
                server_snapshot,
                inner: Mutex::new(Inner {
                    state: Arc::new(state),
                    listeners: BTreeMap::new(),
                    next_listener_id: 0,
                    connection: None,
                    reconnect: None,
                    next_generation: 0,
                }),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// The current snapshot. The same `Arc` is returned until the next
    /// transition.
    pub fn get_snapshot(&self) -> Arc<StreamState> {
        Arc::clone(&self.shared.inner.lock().state)
    }

    /// Snapshot for renders that happen before any connection is attempted.
    /// Always the same value.
    pub fn server_snapshot(&self) -> Arc<StreamState> {
        Arc::clone(&self.shared.server_snapshot)
    }

    /// Registers `listener` and connects if no connection is active. The
    /// listener is removed when the returned [`Subscription`] is dropped or
    /// unsubscribed; removing the last one disconnects.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (id, needs_connection) = {
            let mut inner = self.shared.inner.lock();
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.listeners.insert(id, Arc::new(listener));
            (id, inner.connection.is_none())
        };
        debug!("Listener {id} subscribed");

        if needs_connection {
            self.connect();
        }

        Subscription {
            store: Arc::downgrade(&self.shared),
            id: Some(id),
        }
    }

    /// Switches the stream mode. A change clears the event history, drops the
    /// current connection and any pending reconnect, and immediately
    /// reconnects with the new mode. With no subscribers the store stays idle
    /// and the first `subscribe` connects in the new mode instead. Setting the
    /// current mode does nothing.
    pub fn set_mode(&self, mode: StreamMode) {
        let (listeners, reconnect) = {
            let mut inner = self.shared.inner.lock();
            if inner.state.mode == mode {
                return;
            }
            info!("Switching stream mode {} -> {mode}", inner.state.mode);

            inner.teardown();
            let next = StreamState {
                status: StreamStatus::Idle,
                last_event: None,
                history: Vec::new(),
                mode,
                ..(*inner.state).clone()
            };
            let reconnect = !inner.listeners.is_empty();
            (inner.publish(next), reconnect)
        };

        notify(listeners);
        if reconnect {
            self.connect();
        }
    }

    fn connect(&self) {
        let listeners = {
            let mut inner = self.shared.inner.lock();
            if inner.connection.is_some() {
                return;
            }
            inner.cancel_reconnect();

            let generation = inner.take_generation();
            let url = self.shared.config.stream_url(inner.state.mode);
            info!("Connecting to {url}");

            let events = self
                .shared
                .transport
                .open(&url, self.shared.config.with_credentials);
            let pump = tokio::spawn(pump(Arc::downgrade(&self.shared), generation, events));
            inner.connection = Some(Connection { generation, pump });

            let next = inner.state.with_status(StreamStatus::Connecting);
            inner.publish(next)
        };

        notify(listeners);
    }

    fn dispatch(&self, generation: u64, event: TransportEvent) {
        let listeners = {
            let mut inner = self.shared.inner.lock();
            if !inner.is_current(generation) {
                trace!("Ignoring {event:?} from closed connection {generation}");
                return;
            }

            match event {
                TransportEvent::Open => {
                    debug!("Stream connection {generation} open");
                    let next = inner.state.with_status(StreamStatus::Connected);
                    inner.publish(next)
                }
                TransportEvent::Message(data) => match data.parse::<StreamEvent>() {
                    Ok(event) => {
                        debug!("Received {} event", event.kind());
                        let next = inner.state.apply(event);
                        inner.publish(next)
                    }
                    Err(events::FrameError::Parse(e)) => {
                        error!("Failed to parse SSE payload: {e}");
                        return;
                    }
                    Err(e) => {
                        warn!("Received malformed SSE payload ({e}): {data}");
                        return;
                    }
                },
                TransportEvent::Error(reason) => {
                    let mode = inner.state.mode;
                    warn!("Stream connection {generation} failed: {reason}");

                    let status = match mode {
                        StreamMode::Single => StreamStatus::Idle,
                        StreamMode::Continuous => StreamStatus::Error,
                    };
                    let next = inner.state.with_status(status);
                    let listeners = inner.publish(next);

                    inner.close_connection();
                    inner.cancel_reconnect();
                    if mode == StreamMode::Continuous {
                        self.schedule_reconnect(&mut inner);
                    }
                    listeners
                }
            }
        };

        notify(listeners);
    }

    fn schedule_reconnect(&self, inner: &mut Inner) {
        let token = inner.take_generation();
        let delay = self.shared.config.reconnect_delay;
        let shared = Arc::downgrade(&self.shared);
        debug!("Reconnecting in {}ms", delay.as_millis());

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                EventStore { shared }.reconnect_due(token);
            }
        });
        inner.reconnect = Some(PendingReconnect { token, timer });
    }

    fn reconnect_due(&self, token: u64) {
        {
            let mut inner = self.shared.inner.lock();
            match &inner.reconnect {
                Some(pending) if pending.token == token => inner.reconnect = None,
                _ => return,
            }
        }
        self.connect();
    }

    fn unsubscribe(&self, id: u64) {
        let mut inner = self.shared.inner.lock();
        if inner.listeners.remove(&id).is_none() {
            return;
        }
        debug!("Listener {id} unsubscribed");

        if inner.listeners.is_empty() {
            info!("Last listener gone, disconnecting");
            inner.teardown();
            let mode = inner.state.mode;
            // Nobody is left to notify.
            inner.state = Arc::new(StreamState::idle(
                mode,
                self.shared.config.with_credentials,
            ));
        }
    }
}

async fn pump(shared: Weak<Shared>, generation: u64, mut events: BoxStream<'static, TransportEvent>) {
    while let Some(event) = events.next().await {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let terminal = matches!(event, TransportEvent::Error(_));
        EventStore { shared }.dispatch(generation, event);
        if terminal {
            return;
        }
    }

    if let Some(shared) = shared.upgrade() {
        EventStore { shared }.dispatch(
            generation,
            TransportEvent::Error("connection closed".to_string()),
        );
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    store: Weak<Shared>,
    id: Option<u64>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let (Some(id), Some(shared)) = (self.id.take(), self.store.upgrade()) {
            EventStore { shared }.unsubscribe(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::Payload;
    use futures_util::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc::{self, UnboundedSender};
    use url::Url;

    const RECONNECT: Duration = Duration::from_millis(3000);

    /// Transport whose connections are driven by the test.
    #[derive(Default)]
    struct ScriptedTransport {
        connections: parking_lot::Mutex<Vec<ScriptedConnection>>,
    }

    struct ScriptedConnection {
        url: Url,
        with_credentials: bool,
        sender: UnboundedSender<TransportEvent>,
    }

    impl Transport for ScriptedTransport {
        fn open(&self, url: &Url, with_credentials: bool) -> BoxStream<'static, TransportEvent> {
            let (sender, receiver) = mpsc::unbounded_channel();
            self.connections.lock().push(ScriptedConnection {
                url: url.clone(),
                with_credentials,
                sender,
            });
            stream::unfold(receiver, |mut receiver| async move {
                receiver.recv().await.map(|event| (event, receiver))
            })
            .boxed()
        }
    }

    impl ScriptedTransport {
        fn opened(&self) -> usize {
            self.connections.lock().len()
        }

        fn url(&self, index: usize) -> Url {
            self.connections.lock()[index].url.clone()
        }

        fn send(&self, index: usize, event: TransportEvent) {
            // The store may already have dropped this connection.
            let _ = self.connections.lock()[index].sender.send(event);
        }

        fn message(&self, index: usize, data: &str) {
            self.send(index, TransportEvent::Message(data.to_string()));
        }

        fn hang_up(&self, index: usize) {
            let (sender, _) = mpsc::unbounded_channel();
            self.connections.lock()[index].sender = sender;
        }
    }

    fn store(mode: StreamMode) -> (EventStore, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::default());
        let config = StoreConfig::new("http://localhost:4000/events")
            .unwrap()
            .initial_mode(mode)
            .reconnect_delay(RECONNECT);
        (EventStore::new(config, transport.clone()), transport)
    }

    /// Subscribes a listener that records the status seen on each notification.
    fn record(store: &EventStore) -> (Subscription, Arc<parking_lot::Mutex<Vec<StreamStatus>>>) {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let observer = store.clone();
        let sink = seen.clone();
        let subscription = store.subscribe(move || {
            sink.lock().push(observer.get_snapshot().status);
        });
        (subscription, seen)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn tick(value: u32) -> String {
        format!(r#"{{"type":"tick","at":"2024-01-01T00:00:00.000Z","value":{value},"mode":"continuous"}}"#)
    }

    const HANDSHAKE: &str = r#"{"type":"handshake","at":"2024-01-01T00:00:00.000Z","headers":{"origin":"http://localhost:5173","cookie":"present","userAgent":"test","accept":"text/event-stream"},"withCredentials":false,"mode":"continuous"}"#;

    #[tokio::test]
    async fn test_store_starts_idle_without_connecting() {
        let (store, transport) = store(StreamMode::Continuous);

        let snapshot = store.get_snapshot();
        assert_eq!(snapshot.status, StreamStatus::Idle);
        assert!(snapshot.with_credentials);
        assert_eq!(transport.opened(), 0);
    }

    #[tokio::test]
    async fn test_first_subscriber_connects_with_mode_in_url() {
        let (store, transport) = store(StreamMode::Continuous);

        let (_subscription, seen) = record(&store);

        assert_eq!(transport.opened(), 1);
        assert_eq!(
            transport.url(0).as_str(),
            "http://localhost:4000/events?mode=continuous"
        );
        assert!(transport.connections.lock()[0].with_credentials);
        assert_eq!(*seen.lock(), vec![StreamStatus::Connecting]);
        assert_eq!(store.get_snapshot().status, StreamStatus::Connecting);
    }

    #[tokio::test]
    async fn test_second_subscriber_shares_connection() {
        let (store, transport) = store(StreamMode::Continuous);

        let _first = store.subscribe(|| {});
        let _second = store.subscribe(|| {});

        assert_eq!(transport.opened(), 1);
    }

    #[tokio::test]
    async fn test_open_and_frames_update_state() {
        let (store, transport) = store(StreamMode::Continuous);
        let (_subscription, seen) = record(&store);

        transport.send(0, TransportEvent::Open);
        transport.message(0, HANDSHAKE);
        transport.message(0, &tick(42));
        settle().await;

        let snapshot = store.get_snapshot();
        assert_eq!(snapshot.status, StreamStatus::Connected);
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(snapshot.history[0].kind(), "tick");
        assert_eq!(snapshot.history[1].kind(), "handshake");
        assert_eq!(snapshot.last_value(), Some(42));
        assert_eq!(
            snapshot.headers.as_ref().unwrap().user_agent.as_deref(),
            Some("test")
        );
        assert!(!snapshot.with_credentials);
        assert_eq!(
            *seen.lock(),
            vec![
                StreamStatus::Connecting,
                StreamStatus::Connected,
                StreamStatus::Connected,
                StreamStatus::Connected,
            ]
        );
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_most_recent_first() {
        for count in [1u32, 19, 20, 21, 45] {
            let (store, transport) = store(StreamMode::Continuous);
            let _subscription = store.subscribe(|| {});

            for value in 0..count {
                transport.message(0, &tick(value));
            }
            settle().await;

            let snapshot = store.get_snapshot();
            assert_eq!(snapshot.history.len(), count.min(20) as usize);
            let values: Vec<u32> = snapshot.history.iter().filter_map(|e| e.value()).collect();
            let expected: Vec<u32> = (count.saturating_sub(20)..count).rev().collect();
            assert_eq!(values, expected);
        }
    }

    #[tokio::test]
    async fn test_malformed_frames_leave_state_untouched() {
        let (store, transport) = store(StreamMode::Continuous);
        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = notifications.clone();
        let _subscription = store.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        transport.message(0, &tick(1));
        settle().await;

        let before = store.get_snapshot();
        let notified = notifications.load(Ordering::SeqCst);

        transport.message(0, "not json");
        transport.message(0, r#"{"type":"tick"}"#);
        transport.message(0, r#"{"at":"2024-01-01T00:00:00.000Z"}"#);
        transport.message(0, "42");
        settle().await;

        let after = store.get_snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
        assert_eq!(notifications.load(Ordering::SeqCst), notified);
    }

    #[tokio::test]
    async fn test_unknown_event_types_are_kept() {
        let (store, transport) = store(StreamMode::Continuous);
        let _subscription = store.subscribe(|| {});

        transport.message(0, r#"{"type":"presence","at":"t","who":"someone"}"#);
        settle().await;

        let snapshot = store.get_snapshot();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(
            snapshot.history[0].payload,
            Payload::Other {
                kind: "presence".to_string()
            }
        );
        assert_eq!(snapshot.status, StreamStatus::Connected);
    }

    #[tokio::test]
    async fn test_server_mode_is_adopted() {
        let (store, transport) = store(StreamMode::Continuous);
        let _subscription = store.subscribe(|| {});

        transport.message(
            0,
            r#"{"type":"tick","at":"t","value":1,"mode":"single"}"#,
        );
        settle().await;

        assert_eq!(store.get_snapshot().mode, StreamMode::Single);
        assert_eq!(transport.opened(), 1);
    }

    #[tokio::test]
    async fn test_set_mode_same_mode_is_a_no_op() {
        let (store, transport) = store(StreamMode::Continuous);
        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = notifications.clone();
        let _subscription = store.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        transport.message(0, &tick(5));
        settle().await;

        let before = store.get_snapshot();
        let notified = notifications.load(Ordering::SeqCst);

        store.set_mode(StreamMode::Continuous);

        assert!(Arc::ptr_eq(&before, &store.get_snapshot()));
        assert_eq!(notifications.load(Ordering::SeqCst), notified);
        assert_eq!(transport.opened(), 1);
    }

    #[tokio::test]
    async fn test_set_mode_resets_history_and_reconnects_once() {
        let (store, transport) = store(StreamMode::Continuous);
        let (_subscription, seen) = record(&store);
        transport.send(0, TransportEvent::Open);
        transport.message(0, HANDSHAKE);
        transport.message(0, &tick(5));
        settle().await;
        seen.lock().clear();

        store.set_mode(StreamMode::Single);

        assert_eq!(transport.opened(), 2);
        assert_eq!(
            transport.url(1).as_str(),
            "http://localhost:4000/events?mode=single"
        );
        let snapshot = store.get_snapshot();
        assert_eq!(snapshot.mode, StreamMode::Single);
        assert!(snapshot.history.is_empty());
        assert!(snapshot.last_event.is_none());
        assert_eq!(
            *seen.lock(),
            vec![StreamStatus::Idle, StreamStatus::Connecting]
        );

        // Frames from the replaced connection are ignored.
        transport.message(0, &tick(6));
        settle().await;
        assert!(store.get_snapshot().history.is_empty());
    }

    #[tokio::test]
    async fn test_set_mode_without_subscribers_does_not_connect() {
        let (store, transport) = store(StreamMode::Continuous);

        store.set_mode(StreamMode::Single);

        assert_eq!(store.get_snapshot().mode, StreamMode::Single);
        assert_eq!(store.get_snapshot().status, StreamStatus::Idle);
        assert_eq!(transport.opened(), 0);

        let _subscription = store.subscribe(|| {});
        assert_eq!(
            transport.url(0).as_str(),
            "http://localhost:4000/events?mode=single"
        );
    }

    #[tokio::test]
    async fn test_last_unsubscribe_resets_and_resubscribe_reconnects() {
        let (store, transport) = store(StreamMode::Continuous);
        let subscription = store.subscribe(|| {});
        transport.send(0, TransportEvent::Open);
        transport.message(0, HANDSHAKE);
        settle().await;
        store.set_mode(StreamMode::Single);
        transport.message(1, r#"{"type":"tick","at":"t","value":9,"mode":"single"}"#);
        settle().await;
        assert_eq!(store.get_snapshot().last_value(), Some(9));

        subscription.unsubscribe();

        let snapshot = store.get_snapshot();
        assert_eq!(*snapshot, StreamState::idle(StreamMode::Single, true));

        let (_subscription, seen) = record(&store);
        assert_eq!(*seen.lock(), vec![StreamStatus::Connecting]);
        assert_eq!(transport.opened(), 3);
    }

    #[tokio::test]
    async fn test_dropping_one_of_two_subscriptions_keeps_streaming() {
        let (store, transport) = store(StreamMode::Continuous);
        let first = store.subscribe(|| {});
        let _second = store.subscribe(|| {});

        drop(first);
        transport.message(0, &tick(3));
        settle().await;

        assert_eq!(store.get_snapshot().last_value(), Some(3));
        assert_eq!(transport.opened(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_in_continuous_mode_reconnects_after_delay() {
        let (store, transport) = store(StreamMode::Continuous);
        let (_subscription, seen) = record(&store);
        transport.send(0, TransportEvent::Open);
        settle().await;

        transport.send(0, TransportEvent::Error("boom".to_string()));
        settle().await;
        assert_eq!(store.get_snapshot().status, StreamStatus::Error);
        assert_eq!(transport.opened(), 1);

        tokio::time::sleep(RECONNECT - Duration::from_millis(1)).await;
        assert_eq!(transport.opened(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(transport.opened(), 2);
        assert_eq!(store.get_snapshot().status, StreamStatus::Connecting);
        assert_eq!(
            *seen.lock(),
            vec![
                StreamStatus::Connecting,
                StreamStatus::Connected,
                StreamStatus::Error,
                StreamStatus::Connecting,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_errors_schedule_one_reconnect() {
        let (store, transport) = store(StreamMode::Continuous);
        let _subscription = store.subscribe(|| {});

        transport.send(0, TransportEvent::Error("first".to_string()));
        transport.send(0, TransportEvent::Error("second".to_string()));
        settle().await;

        // A second listener connects straight away, and that connection fails too.
        let _another = store.subscribe(|| {});
        assert_eq!(transport.opened(), 2);
        transport.send(1, TransportEvent::Error("third".to_string()));
        settle().await;

        tokio::time::sleep(RECONNECT * 3).await;
        settle().await;
        assert_eq!(transport.opened(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_stream_counts_as_error() {
        let (store, transport) = store(StreamMode::Continuous);
        let _subscription = store.subscribe(|| {});
        transport.send(0, TransportEvent::Open);
        settle().await;

        transport.hang_up(0);
        settle().await;

        assert_eq!(store.get_snapshot().status, StreamStatus::Error);
        tokio::time::sleep(RECONNECT).await;
        settle().await;
        assert_eq!(transport.opened(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_in_single_mode_goes_idle_without_reconnect() {
        let (store, transport) = store(StreamMode::Single);
        let _subscription = store.subscribe(|| {});
        transport.send(0, TransportEvent::Open);
        transport.message(0, r#"{"type":"tick","at":"t","value":7,"mode":"single"}"#);
        transport.send(0, TransportEvent::Error("closed by server".to_string()));
        settle().await;

        let snapshot = store.get_snapshot();
        assert_eq!(snapshot.status, StreamStatus::Idle);
        assert_eq!(snapshot.last_value(), Some(7));

        tokio::time::sleep(RECONNECT * 2).await;
        settle().await;
        assert_eq!(transport.opened(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_cancels_pending_reconnect() {
        let (store, transport) = store(StreamMode::Continuous);
        let subscription = store.subscribe(|| {});
        transport.send(0, TransportEvent::Error("boom".to_string()));
        settle().await;

        subscription.unsubscribe();
        tokio::time::sleep(RECONNECT * 2).await;
        settle().await;

        assert_eq!(transport.opened(), 1);
        assert_eq!(store.get_snapshot().status, StreamStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_mode_cancels_pending_reconnect() {
        let (store, transport) = store(StreamMode::Continuous);
        let _subscription = store.subscribe(|| {});
        transport.send(0, TransportEvent::Error("boom".to_string()));
        settle().await;

        store.set_mode(StreamMode::Single);
        assert_eq!(transport.opened(), 2);

        tokio::time::sleep(RECONNECT * 2).await;
        settle().await;
        assert_eq!(transport.opened(), 2);
    }

    #[tokio::test]
    async fn test_server_snapshot_is_stable_and_neutral() {
        let (store, _transport) = store(StreamMode::Single);

        let first = store.server_snapshot();
        let second = store.server_snapshot();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.status, StreamStatus::Server);
        assert_eq!(first.mode, StreamMode::Continuous);
        assert!(!Arc::ptr_eq(&first, &store.get_snapshot()));
    }
}
