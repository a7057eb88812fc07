//! Error types for the stream client.

use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// The configured stream endpoint is not an absolute URL.
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    /// A header value the transport was asked to send cannot be encoded.
    InvalidHeader { name: &'static str },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidEndpoint { endpoint, source } => {
                write!(f, "Invalid stream endpoint {endpoint:?}: {source}")
            }
            Error::InvalidHeader { name } => write!(f, "Invalid value for header {name}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidEndpoint { source, .. } => Some(source),
            Error::InvalidHeader { .. } => None,
        }
    }
}
