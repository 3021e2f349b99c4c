//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Open store → Build router → Compose pipeline → Bind listener
//!
//! Serving (manager.rs):
//!     Accept loop task → one task per connection
//!
//! Shutdown (signals.rs → shutdown.rs → manager.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain connections (bounded) → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: store first, listener last
//! - Ordered shutdown: stop accept, drain, join the accept task
//! - Shutdown has a hard deadline: connections still open after it are closed

pub mod manager;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use manager::{LifecycleError, LifecycleManager};
pub use shutdown::{Shutdown, ShutdownListener};
pub use state::{LifecycleState, StateHandle};
