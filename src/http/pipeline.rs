//! Global middleware stack.
//!
//! Stages, outermost first:
//!
//! ```text
//! request
//!   → OS context   attach the OS family to the request context
//!   → request log  start timing, log once the response exists
//!   → recovery     catch panics from routing and handlers
//!   → router       dispatch (basic auth on /todos)
//! ```
//!
//! The order is fixed when the pipeline is built. The OS tag exists before
//! the logger reads it, and recovery is innermost so a panic anywhere in
//! dispatch is contained before it reaches the logger.

use std::sync::Arc;

use axum::{middleware, Router};
use tower::ServiceBuilder;

use crate::http::middleware::{inject_os_context, log_requests, recover_panic, RequestLogger};

/// Names of the global stages, outermost first.
pub const STAGES: [&str; 3] = ["os_context", "request_log", "recovery"];

/// Wrap `router` with the global stack.
pub fn compose(router: Router, logger: Arc<RequestLogger>) -> Router {
    // ServiceBuilder applies layers top to bottom as outermost to innermost.
    router.layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(inject_os_context))
            .layer(middleware::from_fn_with_state(logger, log_requests))
            .layer(middleware::from_fn(recover_panic)),
    )
}
