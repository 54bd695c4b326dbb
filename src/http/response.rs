//! HTTP response building module
//!
//! Every response carries an explicit `Content-Length` equal to the body size.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};

/// Body of every 404 answer
pub const NOT_FOUND_BODY: &str = "<h1>404 Not Found</h1>";

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_HTML: &str = "text/html";

/// Build 200 response carrying serialized JSON
pub fn build_json_response(body: Vec<u8>) -> Response<Full<Bytes>> {
    build_response(StatusCode::OK, APPLICATION_JSON, Bytes::from(body))
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_response(
        StatusCode::NOT_FOUND,
        TEXT_HTML,
        Bytes::from_static(NOT_FOUND_BODY.as_bytes()),
    )
}

fn build_response(status: StatusCode, content_type: &str, body: Bytes) -> Response<Full<Bytes>> {
    let content_length = body.len();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = status;
            fallback
        })
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    tracing::error!(%status, %error, "Failed to build response");
}
