//! Request payloads: JSON mappings and single-file multipart uploads.
//!
//! # Design
//! A body is either a JSON object or exactly one multipart file part. Callers
//! that only have an untyped mapping go through `Body::from_map`, which
//! recognises the `fileContents` key and insists on its three companions
//! before anything is sent.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::GeocoreError;
use crate::result::Result;

pub const FILE_CONTENTS_KEY: &str = "fileContents";
pub const FILE_NAME_KEY: &str = "fileName";
pub const FIELD_NAME_KEY: &str = "fieldName";
pub const MIME_TYPE_KEY: &str = "mimeType";

/// The payload of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Map<String, Value>),
    Multipart(MultipartPayload),
}

impl Body {
    /// Interpret an untyped mapping, switching to multipart when it carries
    /// `fileContents`.
    ///
    /// `fileContents` may be a base64 string or an array of byte values.
    pub fn from_map(mut map: Map<String, Value>) -> Result<Self> {
        let Some(contents) = map.remove(FILE_CONTENTS_KEY) else {
            return Ok(Body::Json(map));
        };

        let file_name = required_string(&map, FILE_NAME_KEY)?;
        let field_name = required_string(&map, FIELD_NAME_KEY)?;
        let mime_type = required_string(&map, MIME_TYPE_KEY)?;
        let file_contents = decode_contents(contents)?;

        let payload = MultipartPayload {
            file_contents,
            file_name,
            field_name,
            mime_type,
        };
        payload.validate()?;
        Ok(Body::Multipart(payload))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Body::Multipart(_))
    }
}

impl From<MultipartPayload> for Body {
    fn from(payload: MultipartPayload) -> Self {
        Body::Multipart(payload)
    }
}

impl From<Map<String, Value>> for Body {
    fn from(map: Map<String, Value>) -> Self {
        Body::Json(map)
    }
}

fn required_string(map: &Map<String, Value>, key: &str) -> Result<String> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(GeocoreError::InvalidParameter(format!(
            "multipart `{key}` must be a string"
        ))),
        None => Err(GeocoreError::InvalidParameter(format!(
            "multipart body is missing `{key}`"
        ))),
    }
}

fn decode_contents(contents: Value) -> Result<Vec<u8>> {
    match contents {
        Value::String(encoded) => STANDARD.decode(encoded.as_bytes()).map_err(|e| {
            GeocoreError::InvalidParameter(format!("`{FILE_CONTENTS_KEY}` is not base64: {e}"))
        }),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| {
                        GeocoreError::InvalidParameter(format!(
                            "`{FILE_CONTENTS_KEY}` must contain byte values"
                        ))
                    })
            })
            .collect(),
        _ => Err(GeocoreError::InvalidParameter(format!(
            "`{FILE_CONTENTS_KEY}` must be base64 or a byte array"
        ))),
    }
}

/// A single file to upload as `multipart/form-data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPayload {
    pub file_contents: Vec<u8>,
    pub file_name: String,
    pub field_name: String,
    pub mime_type: String,
}

impl MultipartPayload {
    pub fn new(
        file_contents: impl Into<Vec<u8>>,
        file_name: impl Into<String>,
        field_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            file_contents: file_contents.into(),
            file_name: file_name.into(),
            field_name: field_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Reject part metadata that would break the part headers: quotes in
    /// the quoted names, line breaks anywhere.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            (FIELD_NAME_KEY, &self.field_name, true),
            (FILE_NAME_KEY, &self.file_name, true),
            (MIME_TYPE_KEY, &self.mime_type, false),
        ];
        for (key, value, quoted) in fields {
            if value.contains(['\r', '\n']) || (quoted && value.contains('"')) {
                return Err(GeocoreError::InvalidParameter(format!(
                    "multipart `{key}` contains a forbidden character"
                )));
            }
        }
        Ok(())
    }

    /// Encode with a freshly generated boundary. Returns the `Content-Type`
    /// header value and the body bytes.
    pub fn encode(&self) -> (String, Vec<u8>) {
        let boundary = generate_boundary();
        let body = self.encode_with_boundary(&boundary);
        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    pub fn encode_with_boundary(&self, boundary: &str) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.file_contents.len() + 256);
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                self.field_name, self.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", self.mime_type).as_bytes());
        body.extend_from_slice(&self.file_contents);
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }
}

fn generate_boundary() -> String {
    format!("Boundary-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn plain_mapping_stays_json() {
        let body = Body::from_map(map(json!({"name": "cafe"}))).unwrap();
        assert_eq!(body, Body::Json(map(json!({"name": "cafe"}))));
        assert!(!body.is_multipart());
    }

    #[test]
    fn file_contents_switches_to_multipart() {
        let body = Body::from_map(map(json!({
            "fileContents": "aGVsbG8=",
            "fileName": "a.txt",
            "fieldName": "data",
            "mimeType": "text/plain"
        })))
        .unwrap();
        assert_eq!(
            body,
            Body::Multipart(MultipartPayload::new(b"hello".to_vec(), "a.txt", "data", "text/plain"))
        );
    }

    #[test]
    fn byte_array_contents_are_accepted() {
        let body = Body::from_map(map(json!({
            "fileContents": [104, 105],
            "fileName": "a.txt",
            "fieldName": "data",
            "mimeType": "text/plain"
        })))
        .unwrap();
        match body {
            Body::Multipart(p) => assert_eq!(p.file_contents, b"hi".to_vec()),
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn missing_companion_keys_are_rejected() {
        for missing in [FILE_NAME_KEY, FIELD_NAME_KEY, MIME_TYPE_KEY] {
            let mut m = map(json!({
                "fileContents": "aGVsbG8=",
                "fileName": "a.txt",
                "fieldName": "data",
                "mimeType": "text/plain"
            }));
            m.remove(missing);
            let err = Body::from_map(m).unwrap_err();
            assert!(
                matches!(&err, GeocoreError::InvalidParameter(msg) if msg.contains(missing)),
                "{missing}: {err}"
            );
        }
    }

    #[test]
    fn bad_byte_values_are_rejected() {
        let err = Body::from_map(map(json!({
            "fileContents": [300],
            "fileName": "a.txt",
            "fieldName": "data",
            "mimeType": "text/plain"
        })))
        .unwrap_err();
        assert!(matches!(err, GeocoreError::InvalidParameter(_)));
    }

    #[test]
    fn header_breaking_metadata_is_rejected() {
        for (key, value) in [
            (FILE_NAME_KEY, "a\".txt"),
            (FILE_NAME_KEY, "a.txt\r\nX-Injected: 1"),
            (FIELD_NAME_KEY, "da\"ta"),
            (MIME_TYPE_KEY, "text/plain\n"),
        ] {
            let mut m = map(json!({
                "fileContents": "aGVsbG8=",
                "fileName": "a.txt",
                "fieldName": "data",
                "mimeType": "text/plain"
            }));
            m.insert(key.to_string(), Value::String(value.to_string()));
            let err = Body::from_map(m).unwrap_err();
            assert!(
                matches!(&err, GeocoreError::InvalidParameter(msg) if msg.contains(key)),
                "{key}={value:?}: {err}"
            );
        }
    }

    #[test]
    fn constructed_payload_validation() {
        assert!(MultipartPayload::new(b"x".to_vec(), "a b.txt", "file", "text/plain; charset=utf-8")
            .validate()
            .is_ok());
        assert!(MultipartPayload::new(b"x".to_vec(), "a\nb", "file", "text/plain")
            .validate()
            .is_err());
    }

    #[test]
    fn multipart_layout() {
        let payload = MultipartPayload::new(b"PNG".to_vec(), "pic.png", "image", "image/png");
        let body = payload.encode_with_boundary("XYZ");
        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"image\"; filename=\"pic.png\"\r\n\
            Content-Type: image/png\r\n\
            \r\n\
            PNG\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn boundaries_are_random() {
        let payload = MultipartPayload::new(b"x".to_vec(), "f", "f", "text/plain");
        let (ct1, _) = payload.encode();
        let (ct2, _) = payload.encode();
        assert!(ct1.starts_with("multipart/form-data; boundary=Boundary-"));
        assert_ne!(ct1, ct2);
    }
}
