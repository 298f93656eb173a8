//! Builds `HttpRequest` descriptors from a method, parameters and body.
//!
//! # Design
//! Placement rules:
//! - GET/DELETE always carry `parameters` on the URL.
//! - POST/PUT carry `parameters` as the JSON payload when there is no body.
//! - When both `parameters` and a body are given, `parameters` go on the URL
//!   and the body is the payload, whatever the method.
//!
//! A token, when present, is attached as the `Geocore-Access-Token` header.

use serde_json::{Map, Value};

use crate::body::Body;
use crate::error::GeocoreError;
use crate::http::{HttpMethod, HttpRequest};
use crate::query::{append_query, encode_query};
use crate::result::Result;

pub const ACCESS_TOKEN_HEADER: &str = "Geocore-Access-Token";
pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Stateless request construction. Session data (URL, token) is passed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestBuilder;

impl RequestBuilder {
    pub fn build(
        method: HttpMethod,
        url: &str,
        parameters: Option<&Map<String, Value>>,
        body: Option<Body>,
        token: Option<&str>,
    ) -> Result<HttpRequest> {
        let mut request = match token {
            Some(token) => Self::authenticated(method, url, token),
            None => Self::unauthenticated(method, url),
        };

        let params = parameters.filter(|p| !p.is_empty());
        match (params, body) {
            (Some(params), Some(body)) => {
                request.url = append_query(&request.url, &encode_query(params));
                Self::attach_body(&mut request, body)?;
            }
            (Some(params), None) if method.encodes_params_in_url() => {
                request.url = append_query(&request.url, &encode_query(params));
            }
            (Some(params), None) => {
                Self::attach_body(&mut request, Body::Json(params.clone()))?;
            }
            (None, Some(body)) => Self::attach_body(&mut request, body)?,
            (None, None) => {}
        }

        tracing::trace!(
            method = %request.method,
            url = %request.url,
            multipart = request.multipart,
            "built request"
        );
        Ok(request)
    }

    fn unauthenticated(method: HttpMethod, url: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
            multipart: false,
        }
    }

    fn authenticated(method: HttpMethod, url: &str, token: &str) -> HttpRequest {
        let mut request = Self::unauthenticated(method, url);
        request
            .headers
            .push((ACCESS_TOKEN_HEADER.to_string(), token.to_string()));
        request
    }

    fn attach_body(request: &mut HttpRequest, body: Body) -> Result<()> {
        match body {
            Body::Json(map) => {
                let bytes = serde_json::to_vec(&Value::Object(map))
                    .map_err(|e| GeocoreError::InvalidParameter(e.to_string()))?;
                request
                    .headers
                    .push((CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string()));
                request.body = Some(bytes);
            }
            Body::Multipart(payload) => {
                payload.validate()?;
                let (content_type, bytes) = payload.encode();
                request
                    .headers
                    .push((CONTENT_TYPE_HEADER.to_string(), content_type));
                request.body = Some(bytes);
                request.multipart = true;
            }
        }
        Ok(())
    }
}
