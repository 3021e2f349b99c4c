//! Per-request context carried in request extensions.
//!
//! The context is stored under its own type, so no other extension can
//! collide with it. It is inserted once by the OS context middleware and
//! only read afterwards; each request owns its own copy.

use axum::http::Request;

use crate::http::user_agent::OsFamily;

/// Value reported by the request logger when no context was attached.
pub const UNKNOWN_OS: &str = "unknown OS";

/// Values attached to a request before it reaches the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    os: OsFamily,
}

impl RequestContext {
    pub fn new(os: OsFamily) -> Self {
        Self { os }
    }

    pub fn os(&self) -> OsFamily {
        self.os
    }

    /// Read the context attached to `request`, if any.
    pub fn of<B>(request: &Request<B>) -> Option<&RequestContext> {
        request.extensions().get::<RequestContext>()
    }

    /// Attach `self` unless the request already carries a context.
    ///
    /// Returns whether the context was attached.
    pub fn attach<B>(self, request: &mut Request<B>) -> bool {
        if request.extensions().get::<RequestContext>().is_some() {
            return false;
        }
        request.extensions_mut().insert(self);
        true
    }
}
