//! HTTP request processing.
//!
//! # Data Flow
//! ```text
//! accepted connection (lifecycle::manager)
//!     → pipeline.rs (OS context → request log → recovery)
//!     → router.rs (path dispatch, basic auth on /todos)
//!     → extract.rs (JSON body and query decoding)
//!     → handlers/ (healthz, todos, diagnostics)
//!     → error.rs (typed errors → status codes)
//! ```

pub mod context;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod router;
pub mod user_agent;

pub use context::RequestContext;
pub use error::ApiError;
pub use router::{build_router, AppState};
pub use user_agent::OsFamily;
