//! Classifies transport results and the Geocore JSON envelope.
//!
//! Wire format of a 200 response:
//!
//! ```text
//! {"status": "success", "result": <node>}
//! {"status": "<anything else>", "code": "<code>", "message": "<message>"}
//! ```
//!
//! Classification is pure: the same input always yields the same outcome.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{GeocoreError, ResponseCode, TransportError};
use crate::http::HttpResponse;
use crate::result::Result;

pub const SUCCESS_STATUS: &str = "success";

#[derive(Debug, Deserialize)]
struct Envelope {
    status: Option<Value>,
    #[serde(default)]
    result: Value,
    code: Option<String>,
    message: Option<String>,
}

/// Classify the outcome of a transport call.
pub fn decode(outcome: std::result::Result<HttpResponse, TransportError>) -> Result<Value> {
    match outcome {
        Ok(response) => decode_response(&response),
        Err(err) => {
            tracing::warn!(error = %err, "geocore request failed at the transport level");
            Err(GeocoreError::NetworkError(err))
        }
    }
}

/// Classify a response that reached the client.
pub fn decode_response(response: &HttpResponse) -> Result<Value> {
    match response.status {
        200 => {}
        403 => return Err(GeocoreError::UnauthorizedAccess),
        status => {
            return Err(GeocoreError::InvalidServerResponse(ResponseCode::Status(status)));
        }
    }

    let body = match response.body.as_deref() {
        Some(body) if !body.is_empty() => body,
        _ => return Err(GeocoreError::InvalidServerResponse(ResponseCode::Unavailable)),
    };

    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|_| GeocoreError::InvalidServerResponse(ResponseCode::UnexpectedShape))?;

    match envelope.status {
        Some(Value::String(status)) if status == SUCCESS_STATUS => Ok(envelope.result),
        Some(Value::String(_)) => Err(GeocoreError::ServerError {
            code: envelope.code.unwrap_or_default(),
            message: envelope.message.unwrap_or_default(),
        }),
        _ => Err(GeocoreError::InvalidServerResponse(ResponseCode::UnexpectedShape)),
    }
}
