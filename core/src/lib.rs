//! Async client core for the Geocore backend.
//!
//! # Overview
//! Every call goes through one pipeline: `RequestBuilder` turns a method,
//! parameters and body into an `HttpRequest`; a `Transport` sends it; the
//! response decoder classifies the reply and unwraps the JSON envelope; the
//! dispatcher converts the `result` node into the caller's type.
//!
//! # Design
//! - Builder and decoder are pure and never touch the network, so they can
//!   also be driven by a foreign host (see the `geocore-ffi` crate).
//! - `Session` is owned by the client and shared with the dispatcher; it is
//!   the only mutable state.
//! - Async methods are primary. Callback forms are derived from them in
//!   `callback`, so both styles see identical results.
//! - The error taxonomy in `error` is closed; nothing is swallowed.

pub mod body;
pub mod callback;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod query;
pub mod request;
pub mod response;
pub mod result;
pub mod session;
pub mod transport;
pub mod types;

pub use body::{Body, MultipartPayload};
pub use client::GeocoreClient;
pub use config::GeocoreConfig;
pub use dispatch::{Dispatcher, FromJson, ToParams};
pub use error::{GeocoreError, ResponseCode, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::RequestBuilder;
pub use result::{Result, ResultExt};
pub use session::{Session, SessionPhase, SessionState};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use types::{AuthResult, GeocoreUser, Identifiable};
