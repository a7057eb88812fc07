//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the `/events` endpoint.
//! Session bookkeeping (Manager, SessionRegistry, frame encoding) lives in
//! the `sse` crate.

pub mod handler;
