//! Connection seam between the store and the network.
//!
//! A [`Transport`] turns a stream URL into a stream of [`TransportEvent`]s.
//! The store owns whatever it gets back: dropping the stream closes the
//! connection, and a stream that simply ends is treated like an error.

use crate::error::Error;
use async_stream::stream;
use eventsource_client::{self as es, Client};
use futures_util::stream::{BoxStream, StreamExt};
use log::*;
use reqwest::header::HeaderValue;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established and frames may follow.
    Open,
    /// Data of one frame, not yet validated.
    Message(String),
    /// The connection failed or was closed by the server. Nothing follows.
    Error(String),
}

pub trait Transport: Send + Sync + 'static {
    fn open(&self, url: &Url, with_credentials: bool) -> BoxStream<'static, TransportEvent>;
}

/// [`Transport`] backed by `eventsource-client`, with its own reconnect logic
/// turned off so the store stays in charge of reconnecting.
pub struct EventSourceTransport {
    cookie: Option<String>,
}

impl EventSourceTransport {
    pub fn new() -> Self {
        Self { cookie: None }
    }

    /// Cookie header to send on connections opened with credentials.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Result<Self, Error> {
        let cookie = cookie.into();
        HeaderValue::from_str(&cookie).map_err(|_| Error::InvalidHeader { name: "Cookie" })?;
        self.cookie = Some(cookie);
        Ok(self)
    }

    fn build_client(&self, url: &Url, with_credentials: bool) -> es::Result<impl Client> {
        let mut builder = es::ClientBuilder::for_url(url.as_str())?
            .reconnect(es::ReconnectOptions::reconnect(false).build());

        if let (true, Some(cookie)) = (with_credentials, &self.cookie) {
            builder = builder.header("Cookie", cookie)?;
        }

        Ok(builder.build())
    }
}

impl Default for EventSourceTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for EventSourceTransport {
    fn open(&self, url: &Url, with_credentials: bool) -> BoxStream<'static, TransportEvent> {
        let client = match self.build_client(url, with_credentials) {
            Ok(client) => client,
            Err(e) => {
                let reason = format!("Failed to build stream client: {e:?}");
                return futures_util::stream::once(async move { TransportEvent::Error(reason) })
                    .boxed();
            }
        };

        let target = url.to_string();
        stream! {
            let mut frames = client.stream();
            let mut opened = false;

            let reason = loop {
                match frames.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        if !opened {
                            opened = true;
                            yield TransportEvent::Open;
                        }
                        yield TransportEvent::Message(event.data);
                    }
                    Some(Ok(es::SSE::Comment(_))) => {
                        // Comments carry no data but do prove the stream is up
                        if !opened {
                            opened = true;
                            yield TransportEvent::Open;
                        }
                    }
                    Some(Err(e)) => break format!("{e:?}"),
                    None => break "stream ended".to_string(),
                }
            };

            debug!("Stream {target} closed: {reason}");
            yield TransportEvent::Error(reason);
        }
        .boxed()
    }
}
