//! Diagnostic endpoints exercising the middleware stack.

use axum::{extract::Request, http::header};

use crate::http::context::RequestContext;
use crate::http::error::ApiError;

/// Always panics; the recovery middleware turns this into a 500.
pub async fn do_panic() -> &'static str {
    panic!("Panic!")
}

/// Echo the `User-Agent` header together with the OS detected from it.
pub async fn test_os(request: Request) -> Result<String, ApiError> {
    let ctx = RequestContext::of(&request).ok_or(ApiError::ContextMissing)?;
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    Ok(format!(
        "User-Agent: {}\nDetected OS: {}",
        user_agent,
        ctx.os()
    ))
}
