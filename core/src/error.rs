//! Error types for the Geocore client.
//!
//! # Design
//! The taxonomy is closed: every failure the pipeline can produce maps to
//! exactly one `GeocoreError` variant, and each variant carries only what a
//! caller needs to diagnose it. Transport errors are kept behind an `Arc` so
//! a `Result` can be cloned and handed to more than one consumer.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// What went wrong with a response that could not be classified as an
/// envelope, or whose HTTP status was not one the client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    /// The server answered with this unexpected HTTP status.
    Status(u16),
    /// A 200 response arrived without a body.
    Unavailable,
    /// A 200 response body had no recognizable envelope `status` field.
    UnexpectedShape,
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCode::Status(status) => write!(f, "HTTP {status}"),
            ResponseCode::Unavailable => write!(f, "response unavailable"),
            ResponseCode::UnexpectedShape => write!(f, "unexpected response shape"),
        }
    }
}

/// Failure raised by the transport before any HTTP status was observed
/// (DNS, connect, TLS, timeout...).
#[derive(Debug, Clone)]
pub struct TransportError(Arc<dyn StdError + Send + Sync>);

impl TransportError {
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(err))
    }

    /// Build a transport error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(Arc::new(MessageError(message.into())))
    }

    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.0.as_ref())
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct MessageError(String);

/// Every failure a Geocore operation can report.
#[derive(Debug, Clone, Error)]
pub enum GeocoreError {
    /// An internal invariant was violated, e.g. login succeeded without a token.
    #[error("invalid client state")]
    InvalidState,

    /// The response status or shape was not one the client understands.
    #[error("invalid server response: {0}")]
    InvalidServerResponse(ResponseCode),

    /// The `result` payload could not be turned into the requested type.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The backend reported a failure inside the envelope.
    #[error("server error {code}: {message}")]
    ServerError { code: String, message: String },

    /// The operation needs an access token and none is configured.
    #[error("access token undefined")]
    TokenUndefined,

    /// The backend answered 403.
    #[error("unauthorized access")]
    UnauthorizedAccess,

    /// Caller-supplied arguments were rejected before any I/O.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("network error: {0}")]
    NetworkError(#[source] TransportError),
}

impl GeocoreError {
    /// Server-provided error code, if this is a `ServerError`.
    pub fn server_code(&self) -> Option<&str> {
        match self {
            GeocoreError::ServerError { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<TransportError> for GeocoreError {
    fn from(err: TransportError) -> Self {
        GeocoreError::NetworkError(err)
    }
}
