//! TODO HTTP service library.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ net::listener ──▶ lifecycle::manager (one task per connection)
//!                                        │
//!                                        ▼
//!              http::pipeline   OS context → request log → recovery
//!                                        │
//!                                        ▼
//!              http::router     /healthz  /todos (basic auth)  /do-panic  /test-os
//!                                        │
//!                                        ▼
//!              service::todo ──▶ store (SQLite via sqlx)
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod net;
pub mod observability;
pub mod service;
pub mod store;

pub use config::ServerConfig;
pub use lifecycle::{LifecycleManager, Shutdown};
