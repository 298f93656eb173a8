//! C-ABI wrapper around `geocore-core`.
//!
//! # Overview
//! Exposes the request builder, the response decoder and the session through
//! `extern "C"` functions, so a host written in any language with a C FFI can
//! perform the HTTP round-trip itself while sharing the exact request
//! construction and error classification of the Rust client.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary. Closures that touch the session are
//!   wrapped in `AssertUnwindSafe`; the session lock is released on unwind.
//! - A single `FfiGeocoreResult` conveys success payloads (as JSON text) and
//!   errors uniformly. `geocore_decode_response_with_callback` delivers the
//!   same value through a C callback instead of a return value.
//! - The C caller owns all returned pointers and must call the matching
//!   `geocore_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};

use geocore_core::response::{decode, decode_response};
use geocore_core::{
    Body, HttpMethod, HttpResponse, MultipartPayload, RequestBuilder, Session, TransportError,
};
use serde_json::{Map, Value};

use types::*;

/// Completion callback for `geocore_decode_response_with_callback`. The
/// result pointer is only valid for the duration of the call.
pub type GeocoreResultCallback =
    Option<extern "C" fn(result: *const FfiGeocoreResult, user_data: *mut c_void)>;

/// Borrow a C string as `&str`; null or invalid UTF-8 yields `None`.
fn opt_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

/// Parse an optional JSON-object argument. `Err(())` if it is present but
/// not a JSON object.
fn opt_object(s: *const c_char) -> Result<Option<Map<String, Value>>, ()> {
    match opt_str(s) {
        None => Ok(None),
        Some(text) => match serde_json::from_str(text) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            _ => Err(()),
        },
    }
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new session handle. Either argument may be null, in which case
/// the session starts unconfigured and `geocore_setup` must be called.
/// The caller must free the returned pointer with `geocore_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_client_new(
    base_url: *const c_char,
    project_id: *const c_char,
) -> *mut FfiGeocoreClient {
    catch_unwind(|| {
        let session = Session::new();
        if let (Some(url), Some(project)) = (opt_str(base_url), opt_str(project_id)) {
            session.setup(url, project);
        }
        Box::into_raw(Box::new(FfiGeocoreClient { session }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `geocore_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_client_free(client: *mut FfiGeocoreClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

/// Point the session at a backend. Returns false on null arguments.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_setup(
    client: *const FfiGeocoreClient,
    base_url: *const c_char,
    project_id: *const c_char,
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return false;
        }
        let client = unsafe { &*client };
        match (opt_str(base_url), opt_str(project_id)) {
            (Some(url), Some(project)) => {
                client.session.setup(url, project);
                true
            }
            _ => false,
        }
    }))
    .unwrap_or(false)
}

/// Record a successful login. A null `token` clears the session's token.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_set_token(
    client: *const FfiGeocoreClient,
    user_id: *const c_char,
    token: *const c_char,
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return false;
        }
        let client = unsafe { &*client };
        match (opt_str(user_id), opt_str(token)) {
            (Some(user_id), Some(token)) => {
                client.session.authenticate(user_id, token);
                true
            }
            (_, None) => {
                client.session.clear_token();
                true
            }
            (None, Some(_)) => false,
        }
    }))
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a request for `path` relative to the session's base URL.
///
/// `params_json` and `body_json` are optional JSON objects. A body carrying
/// `fileContents` (base64) plus `fileName`, `fieldName` and `mimeType`
/// becomes a multipart upload.
/// Returns null on null `client`/`path`, malformed JSON, an incomplete
/// multipart body, or an unconfigured session.
/// The caller must free the result with `geocore_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_build_request(
    client: *const FfiGeocoreClient,
    method: FfiHttpMethod,
    path: *const c_char,
    params_json: *const c_char,
    body_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(path) = opt_str(path) else {
            return std::ptr::null_mut();
        };
        let (Ok(params), Ok(body)) = (opt_object(params_json), opt_object(body_json)) else {
            return std::ptr::null_mut();
        };
        let Ok(body) = body.map(Body::from_map).transpose() else {
            return std::ptr::null_mut();
        };
        build(&client.session, method.into(), path, params, body)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Build a single-file multipart POST.
///
/// Returns null if any pointer argument is null or the session is
/// unconfigured. `contents` may be null only when `contents_len` is 0.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_build_upload(
    client: *const FfiGeocoreClient,
    path: *const c_char,
    contents: *const u8,
    contents_len: usize,
    file_name: *const c_char,
    field_name: *const c_char,
    mime_type: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() || (contents.is_null() && contents_len > 0) {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(path), Some(file_name), Some(field_name), Some(mime_type)) = (
            opt_str(path),
            opt_str(file_name),
            opt_str(field_name),
            opt_str(mime_type),
        ) else {
            return std::ptr::null_mut();
        };
        let bytes = if contents_len == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(contents, contents_len) }.to_vec()
        };
        let payload = MultipartPayload::new(bytes, file_name, field_name, mime_type);
        build(
            &client.session,
            HttpMethod::Post,
            path,
            None,
            Some(Body::Multipart(payload)),
        )
    }))
    .unwrap_or(std::ptr::null_mut())
}

fn build(
    session: &Session,
    method: HttpMethod,
    path: &str,
    params: Option<Map<String, Value>>,
    body: Option<Body>,
) -> *mut FfiHttpRequest {
    let Ok(url) = session.url_for(path) else {
        return std::ptr::null_mut();
    };
    let token = session.token();
    match RequestBuilder::build(method, &url, params.as_ref(), body, token.as_deref()) {
        Ok(req) => FfiHttpRequest::from_core(req),
        Err(_) => std::ptr::null_mut(),
    }
}

// ---------------------------------------------------------------------------
// Decode functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    if resp.body.is_null() {
        return HttpResponse::empty(resp.status);
    }
    let body = if resp.body_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(resp.body, resp.body_len) }.to_vec()
    };
    HttpResponse::new(resp.status, body)
}

fn decode_ffi(response: *const FfiHttpResponse) -> *mut FfiGeocoreResult {
    if response.is_null() {
        return FfiGeocoreResult::null_arg("response");
    }
    let resp = unsafe { &*response };
    match decode_response(&ffi_response_to_core(resp)) {
        Ok(result) => FfiGeocoreResult::ok(result),
        Err(e) => FfiGeocoreResult::from_error(e),
    }
}

/// Classify a response and unwrap its envelope.
///
/// On success `result_json` holds the `result` node as JSON text.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_decode_response(
    response: *const FfiHttpResponse,
) -> *mut FfiGeocoreResult {
    catch_unwind(|| decode_ffi(response))
        .unwrap_or_else(|_| FfiGeocoreResult::panic("panic in geocore_decode_response"))
}

/// Report a transport failure (no HTTP status was received). Always yields
/// a `NetworkError` result carrying `message`.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_decode_transport_error(message: *const c_char) -> *mut FfiGeocoreResult {
    catch_unwind(|| {
        let message = opt_str(message).unwrap_or("transport error");
        match decode(Err(TransportError::msg(message))) {
            Ok(result) => FfiGeocoreResult::ok(result),
            Err(e) => FfiGeocoreResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiGeocoreResult::panic("panic in geocore_decode_transport_error"))
}

/// Callback form of `geocore_decode_response`: the result is passed to
/// `callback` together with `user_data` and freed when the callback returns.
/// Returns false (without calling anything) if `callback` is null.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_decode_response_with_callback(
    response: *const FfiHttpResponse,
    callback: GeocoreResultCallback,
    user_data: *mut c_void,
) -> bool {
    let Some(callback) = callback else {
        return false;
    };
    let result = geocore_decode_response(response);
    callback(result, user_data);
    geocore_free_result(result);
    true
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `geocore_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        unsafe { free_raw_bytes(req.body, req.body_len) };
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiGeocoreResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn geocore_free_result(result: *mut FfiGeocoreResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        for s in [result.error_message, result.server_code, result.result_json] {
            if !s.is_null() {
                drop(unsafe { CString::from_raw(s) });
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
