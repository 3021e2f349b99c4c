//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! The request logger middleware adds one access log line per request.
//! ```

pub mod logging;
pub mod metrics;
