//! # Framework Errors
//!
//! This module defines the common error types used throughout the entity framework.
//! Absence (an unknown id, a 404-equivalent fetch) is never an error: it is reported
//! as `None`. Everything here is either a transport failure propagated unchanged,
//! a decoding problem, or a broken construction context.

use crate::id::Id;

/// Error type returned by a [`RestTransport`](crate::transport::RestTransport).
///
/// Transport failures are opaque to the cache: they are wrapped once and never retried.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur within the entity framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Client dropped")]
    ClientDropped,
    #[error("Request cancelled")]
    Cancelled,
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),
    #[error("Failed to decode {kind} model: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode {kind} request body: {source}")]
    Encode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{kind} {id} requires a {parent} in its cache path")]
    MissingPath {
        kind: &'static str,
        id: Id,
        parent: &'static str,
    },
    #[error("{kind} model id {actual} does not match actor id {expected}")]
    IdMismatch {
        kind: &'static str,
        expected: Id,
        actual: Id,
    },
    #[error("{kind} does not support {operation}")]
    Unsupported {
        kind: &'static str,
        operation: &'static str,
    },
    #[error("Transport returned no model for {kind} {id}")]
    MissingModel { kind: &'static str, id: Id },
    #[error("Dispatcher closed")]
    DispatcherClosed,
    #[error("Dispatcher dropped response channel")]
    DispatcherDropped,
    #[error("Dispatch error: {0}")]
    Dispatch(Box<dyn std::error::Error + Send + Sync>),
}
