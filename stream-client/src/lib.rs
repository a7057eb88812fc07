//! Client for the event stream.
//!
//! [`EventStore`] keeps one connection to the server's `/events` route for all
//! of its subscribers, folds frames into [`StreamState`] snapshots and
//! reconnects after failures while the stream runs in continuous mode.
//! `stream-watch` is a terminal front end for it.

pub mod api_client;
pub mod config;
pub mod error;
pub mod output;
pub mod state;
pub mod store;
pub mod transport;

pub use config::{StoreConfig, DEFAULT_ENDPOINT, DEFAULT_RECONNECT_DELAY};
pub use error::Error;
pub use state::{StreamState, StreamStatus, HISTORY_LIMIT};
pub use store::{EventStore, Subscription};
pub use transport::{EventSourceTransport, Transport, TransportEvent};
