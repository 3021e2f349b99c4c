//! Panic recovery middleware.
//!
//! A panic raised while producing a response is caught here, logged, and
//! turned into a plain-text 500 so the connection task and the process keep
//! running. Response heads are only written after the inner service returns,
//! so a caught panic can always still choose the status. Panics raised later,
//! while a streaming body is being written, are outside this boundary and end
//! that one connection.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;

use crate::observability::metrics;

pub const INTERNAL_SERVER_ERROR_BODY: &str = "Internal Server Error";

pub async fn recover_panic(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            tracing::error!(
                path = %path,
                panic = %panic_message(payload.as_ref()),
                "Recovered from panic while serving request"
            );
            metrics::record_panic_recovered();
            internal_server_error()
        }
    }
}

fn internal_server_error() -> Response {
    let mut response = Response::new(Body::from(INTERNAL_SERVER_ERROR_BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Render a panic payload. `panic!` produces `&str` or `String`; anything
/// else is opaque.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
