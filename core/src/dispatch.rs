//! Build -> send -> decode -> convert, generic over the target type.
//!
//! # Design
//! The dispatcher never names a concrete domain type. Anything that can be
//! constructed from a JSON node (`FromJson`, implemented for every serde
//! `DeserializeOwned`) can be requested, either as one object or as a list.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::body::Body;
use crate::error::GeocoreError;
use crate::http::HttpMethod;
use crate::request::RequestBuilder;
use crate::response;
use crate::result::Result;
use crate::session::Session;
use crate::transport::Transport;

/// Construct a value from a decoded `result` node.
pub trait FromJson: Sized {
    fn from_json(node: Value) -> Result<Self>;
}

impl<T: DeserializeOwned> FromJson for T {
    fn from_json(node: Value) -> Result<Self> {
        serde_json::from_value(node).map_err(|e| GeocoreError::UnexpectedResponse(e.to_string()))
    }
}

/// Flatten a value into request parameters.
pub trait ToParams {
    fn to_params(&self) -> Result<Map<String, Value>>;
}

impl<T: Serialize + ?Sized> ToParams for T {
    fn to_params(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(GeocoreError::InvalidParameter(format!(
                "expected an object, got {other}"
            ))),
            Err(e) => Err(GeocoreError::InvalidParameter(e.to_string())),
        }
    }
}

/// Convert a `result` node into a list; anything but an array is empty.
pub fn list_from_json<R: FromJson>(node: Value) -> Result<Vec<R>> {
    match node {
        Value::Array(items) => items.into_iter().map(R::from_json).collect(),
        _ => Ok(Vec::new()),
    }
}

pub struct Dispatcher<T> {
    session: Arc<Session>,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(session: Arc<Session>, transport: T) -> Self {
        Self { session, transport }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one call and hand back the envelope's `result` node.
    pub async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
    ) -> Result<Value> {
        let url = self.session.url_for(path)?;
        let token = self.session.token();
        let request = RequestBuilder::build(
            method,
            &url,
            parameters.as_ref(),
            body,
            token.as_deref(),
        )?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            authenticated = token.is_some(),
            "dispatching geocore request"
        );
        response::decode(self.transport.send(request).await)
    }

    pub async fn dispatch_one<R: FromJson>(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
    ) -> Result<R> {
        let node = self.dispatch(method, path, parameters, body).await?;
        R::from_json(node)
    }

    pub async fn dispatch_list<R: FromJson>(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
    ) -> Result<Vec<R>> {
        let node = self.dispatch(method, path, parameters, body).await?;
        list_from_json(node)
    }
}
