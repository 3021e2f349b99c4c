//! Request middleware units.
//!
//! Each unit is an `axum::middleware::from_fn` function of shape
//! `(request, next) -> response`. The global ones are stacked by
//! [`crate::http::pipeline`]; basic auth is attached per route by the router.

pub mod basic_auth;
pub mod os_context;
pub mod recovery;
pub mod request_log;

pub use basic_auth::{require_basic_auth, Credentials};
pub use os_context::inject_os_context;
pub use recovery::recover_panic;
pub use request_log::{log_requests, LogRecord, RecordSink, RequestLogger, TracingSink};
