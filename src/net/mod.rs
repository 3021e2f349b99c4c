//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bounded accept, connection slots)
//!     → connection.rs (id + in-flight tracking)
//!     → Hand off to the lifecycle manager's connection tasks
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Accept errors are classified: only a broken listening socket is fatal
//! - Each connection tracked so shutdown can report what it drained

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionTracker};
pub use listener::{Accepted, Acceptor, Listener, ListenerError};
