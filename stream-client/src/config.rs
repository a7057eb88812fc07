use crate::error::Error;
use events::StreamMode;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/events";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Fixed settings for an `EventStore`.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    endpoint: Url,
    pub with_credentials: bool,
    pub reconnect_delay: Duration,
    pub initial_mode: StreamMode,
}

impl StoreConfig {
    pub fn new(endpoint: &str) -> Result<Self, Error> {
        let endpoint = Url::parse(endpoint).map_err(|source| Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;

        Ok(Self {
            endpoint,
            with_credentials: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            initial_mode: StreamMode::default(),
        })
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn initial_mode(mut self, mode: StreamMode) -> Self {
        self.initial_mode = mode;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The endpoint with `mode` set as its query parameter. Any `mode` already
    /// on the endpoint is replaced; other parameters are kept.
    pub fn stream_url(&self, mode: StreamMode) -> Url {
        let mut url = self.endpoint.clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "mode")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("mode", mode.as_str());
        url
    }
}
