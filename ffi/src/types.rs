//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` for strings, pointer + length for byte buffers and header
//! arrays, and tagged enums with explicit discriminants. Conversion helpers
//! live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use geocore_core::{GeocoreError, HttpMethod, HttpRequest, Session};
use serde_json::Value;

/// Opaque handle to a session. C callers receive a pointer to this and pass
/// it back into every FFI function.
pub struct FfiGeocoreClient {
    pub(crate) session: Session,
}

/// Convert to a heap C string, dropping interior NULs.
pub(crate) fn to_c_string(s: impl Into<String>) -> *mut c_char {
    let mut s = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

/// Move a byte buffer onto the heap as pointer + length.
pub(crate) fn into_raw_bytes(bytes: Vec<u8>) -> (*mut u8, usize) {
    let len = bytes.len();
    if len == 0 {
        return (std::ptr::null_mut(), 0);
    }
    (Box::into_raw(bytes.into_boxed_slice()) as *mut u8, len)
}

/// Reclaim a buffer produced by `into_raw_bytes`.
///
/// # Safety
/// `ptr`/`len` must come from `into_raw_bytes` and not have been freed.
pub(crate) unsafe fn free_raw_bytes(ptr: *mut u8, len: usize) {
    if !ptr.is_null() && len > 0 {
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `geocore_build_*`. The C caller executes it and feeds the reply
/// to `geocore_decode_response`. `body` is binary (multipart uploads) and
/// therefore comes with an explicit length.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
    pub multipart: bool,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };
        let (body, body_len) = into_raw_bytes(req.body.unwrap_or_default());

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: to_c_string(req.url),
            headers,
            headers_len,
            body,
            body_len,
            multipart: req.multipart,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request. A
/// null `body` means the transport received no body at all. The FFI layer
/// reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const u8,
    pub body_len: usize,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiGeocoreResult`, one per core error kind plus
/// the FFI-only `Panic` and `NullArg`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidState = 1,
    InvalidServerResponse = 2,
    UnexpectedResponse = 3,
    ServerError = 4,
    TokenUndefined = 5,
    UnauthorizedAccess = 6,
    InvalidParameter = 7,
    NetworkError = 8,
    Panic = 9,
    NullArg = 10,
}

/// Result envelope for decode operations.
///
/// On success `error_code` is `Ok` and `result_json` holds the envelope's
/// `result` node serialized as JSON. On failure `error_message` is set,
/// `server_code` carries the backend code for `ServerError`, and
/// `http_status` the offending status for `InvalidServerResponse` (0 when
/// the failure was not about a status).
#[repr(C)]
pub struct FfiGeocoreResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub server_code: *mut c_char,
    pub http_status: u16,
    pub result_json: *mut c_char,
}

impl FfiGeocoreResult {
    fn boxed(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    fn failure(error_code: FfiErrorCode, message: String) -> Self {
        FfiGeocoreResult {
            error_code,
            error_message: to_c_string(message),
            server_code: std::ptr::null_mut(),
            http_status: 0,
            result_json: std::ptr::null_mut(),
        }
    }

    pub(crate) fn ok(result: Value) -> *mut Self {
        FfiGeocoreResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            server_code: std::ptr::null_mut(),
            http_status: 0,
            result_json: to_c_string(result.to_string()),
        }
        .boxed()
    }

    pub(crate) fn from_error(err: GeocoreError) -> *mut Self {
        let message = err.to_string();
        let mut result = match err {
            GeocoreError::InvalidState => Self::failure(FfiErrorCode::InvalidState, message),
            GeocoreError::InvalidServerResponse(code) => {
                let mut result = Self::failure(FfiErrorCode::InvalidServerResponse, message);
                if let geocore_core::ResponseCode::Status(status) = code {
                    result.http_status = status;
                }
                result
            }
            GeocoreError::UnexpectedResponse(_) => {
                Self::failure(FfiErrorCode::UnexpectedResponse, message)
            }
            GeocoreError::ServerError { code, .. } => {
                let mut result = Self::failure(FfiErrorCode::ServerError, message);
                result.server_code = to_c_string(code);
                result
            }
            GeocoreError::TokenUndefined => Self::failure(FfiErrorCode::TokenUndefined, message),
            GeocoreError::UnauthorizedAccess => {
                Self::failure(FfiErrorCode::UnauthorizedAccess, message)
            }
            GeocoreError::InvalidParameter(_) => {
                Self::failure(FfiErrorCode::InvalidParameter, message)
            }
            GeocoreError::NetworkError(_) => Self::failure(FfiErrorCode::NetworkError, message),
        };
        if result.error_code == FfiErrorCode::UnauthorizedAccess {
            result.http_status = 403;
        }
        result.boxed()
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}")).boxed()
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg.to_string()).boxed()
    }
}
