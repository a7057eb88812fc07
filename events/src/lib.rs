//! Wire model for the push stream.
//!
//! Every frame on the `/events` stream carries one JSON encoded [`StreamEvent`].
//! The server builds events with the typed constructors and serializes them;
//! clients decode untrusted frames with [`StreamEvent::from_str`], which only
//! insists on a string `type` and a string `at`. Event types this crate does
//! not know about decode to [`Payload::Other`] and keep just the base fields.
//!
//! This crate has no dependencies on the other workspace crates so both the
//! server (`sse`) and the client (`stream-client`) can share it.

use chrono::{SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;

/// How long a stream session lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    /// Heartbeats and ticks until the connection goes away.
    #[default]
    Continuous,
    /// One handshake, one tick, then the server closes the stream.
    Single,
}

impl StreamMode {
    /// Resolves the `mode` query parameter. Only `single` (in any case) selects
    /// single-shot streaming; a missing or unrecognized value is continuous.
    pub fn from_query(param: Option<&str>) -> Self {
        match param {
            Some(value) if value.eq_ignore_ascii_case("single") => StreamMode::Single,
            _ => StreamMode::Continuous,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamMode::Continuous => "continuous",
            StreamMode::Single => "single",
        }
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the inbound request carried a `Cookie` header. The cookie value
/// itself is never echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookiePresence {
    Present,
    #[default]
    Absent,
}

/// Summary of the request headers a session was opened with.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderSnapshot {
    pub origin: Option<String>,
    #[serde(default)]
    pub cookie: CookiePresence,
    pub user_agent: Option<String>,
    pub accept: Option<String>,
}

impl HeaderSnapshot {
    /// Field-by-field decode of an inbound header summary. Every field is
    /// nullable: a missing, null or mistyped text field becomes `None`, and
    /// any cookie value other than `"present"` counts as absent. A value that
    /// is not an object yields the empty summary.
    pub fn from_value(value: &Value) -> Self {
        let text = |field: &str| value.get(field).and_then(Value::as_str).map(str::to_string);
        let cookie = match value.get("cookie").and_then(Value::as_str) {
            Some("present") => CookiePresence::Present,
            _ => CookiePresence::Absent,
        };

        Self {
            origin: text("origin"),
            cookie,
            user_agent: text("userAgent"),
            accept: text("accept"),
        }
    }
}

/// Variant specific part of a [`StreamEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// First event of every session.
    Handshake {
        headers: HeaderSnapshot,
        with_credentials: bool,
    },
    Heartbeat,
    /// Random sample in `[0, 1000)`.
    Tick { value: u32 },
    /// A type this build does not recognize, or a known type whose payload
    /// did not decode. Only `type`, `at` and `mode` are kept.
    Other { kind: String },
}

/// One event on the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    /// ISO-8601 emission time, set by the server.
    pub at: String,
    /// Mode of the emitting session. Always set by this server, optional on
    /// the wire.
    pub mode: Option<StreamMode>,
    pub payload: Payload,
}

impl StreamEvent {
    pub fn handshake(mode: StreamMode, headers: HeaderSnapshot, with_credentials: bool) -> Self {
        Self::now(
            mode,
            Payload::Handshake {
                headers,
                with_credentials,
            },
        )
    }

    pub fn heartbeat(mode: StreamMode) -> Self {
        Self::now(mode, Payload::Heartbeat)
    }

    pub fn tick(mode: StreamMode, value: u32) -> Self {
        Self::now(mode, Payload::Tick { value })
    }

    fn now(mode: StreamMode, payload: Payload) -> Self {
        Self {
            at: timestamp(),
            mode: Some(mode),
            payload,
        }
    }

    /// The wire discriminant (`type` field).
    pub fn kind(&self) -> &str {
        match &self.payload {
            Payload::Handshake { .. } => "handshake",
            Payload::Heartbeat => "heartbeat",
            Payload::Tick { .. } => "tick",
            Payload::Other { kind } => kind,
        }
    }

    pub fn value(&self) -> Option<u32> {
        match self.payload {
            Payload::Tick { value } => Some(value),
            _ => None,
        }
    }

    /// Decodes an already parsed JSON value.
    ///
    /// The value must be an object with string `type` and `at` fields; any
    /// other shape is rejected. A `mode` that is not a known mode is dropped
    /// rather than failing the whole frame.
    pub fn from_value(value: Value) -> Result<Self, FrameError> {
        let Value::Object(mut record) = value else {
            return Err(FrameError::NotAnObject);
        };

        let kind = take_string(&mut record, "type")?;
        let at = take_string(&mut record, "at")?;
        let mode = record
            .remove("mode")
            .and_then(|mode| serde_json::from_value(mode).ok());

        Ok(Self {
            at,
            mode,
            payload: Payload::from_record(kind, record),
        })
    }
}

impl FromStr for StreamEvent {
    type Err = FrameError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(data).map_err(FrameError::Parse)?;
        Self::from_value(value)
    }
}

impl Serialize for StreamEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.kind())?;
        map.serialize_entry("at", &self.at)?;
        match &self.payload {
            Payload::Handshake {
                headers,
                with_credentials,
            } => {
                map.serialize_entry("headers", headers)?;
                map.serialize_entry("withCredentials", with_credentials)?;
            }
            Payload::Tick { value } => map.serialize_entry("value", value)?,
            Payload::Heartbeat | Payload::Other { .. } => {}
        }
        if let Some(mode) = &self.mode {
            map.serialize_entry("mode", mode)?;
        }
        map.end()
    }
}

impl Payload {
    fn from_record(kind: String, mut record: Map<String, Value>) -> Self {
        match kind.as_str() {
            "handshake" => {
                match record.remove("headers") {
                    Some(headers) => Payload::Handshake {
                        headers: HeaderSnapshot::from_value(&headers),
                        with_credentials: truthy(record.get("withCredentials")),
                    },
                    None => Payload::Other { kind },
                }
            }
            "heartbeat" => Payload::Heartbeat,
            "tick" => match record
                .get("value")
                .and_then(Value::as_u64)
                .and_then(|value| u32::try_from(value).ok())
            {
                Some(value) => Payload::Tick { value },
                None => Payload::Other { kind },
            },
            _ => Payload::Other { kind },
        }
    }
}

/// Why an inbound frame was rejected.
#[derive(Debug)]
pub enum FrameError {
    /// The frame data is not JSON.
    Parse(serde_json::Error),
    /// The frame is JSON but not an object.
    NotAnObject,
    /// A required base field is absent or not a string.
    MissingField(&'static str),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Parse(err) => write!(f, "frame is not valid JSON: {err}"),
            FrameError::NotAnObject => write!(f, "frame is not a JSON object"),
            FrameError::MissingField(field) => {
                write!(f, "frame is missing string field `{field}`")
            }
        }
    }
}

impl StdError for FrameError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            FrameError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Current UTC time in the `2024-01-01T12:00:00.000Z` form.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn take_string(record: &mut Map<String, Value>, field: &'static str) -> Result<String, FrameError> {
    match record.remove(field) {
        Some(Value::String(value)) => Ok(value),
        _ => Err(FrameError::MissingField(field)),
    }
}

// Loose boolean coercion: the flag is informational, so a sender that encodes
// it as 1 or "true" is still honoured.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    }
}
