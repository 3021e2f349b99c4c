//! Access logging middleware.
//!
//! One [`LogRecord`] is emitted per completed request. The inner chain runs
//! to completion first, including any panic recovery below this layer, so the
//! recorded latency covers the whole request.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::http::context::{RequestContext, UNKNOWN_OS};
use crate::observability::metrics;

/// One access log line.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// Request start, in the logger's timezone.
    pub timestamp: DateTime<FixedOffset>,
    /// Wall time spent in the inner chain, in microseconds.
    pub latency_us: u64,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub os: String,
}

/// Destination for access log records.
pub trait RecordSink: Send + Sync + 'static {
    fn emit(&self, record: &LogRecord);
}

/// Writes each record as a single JSON line through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn emit(&self, record: &LogRecord) {
        match serde_json::to_string(record) {
            Ok(line) => tracing::info!(target: "access_log", "{}", line),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize access log record"),
        }
    }
}

/// Request logger configuration: where records go and which timezone
/// their timestamps use.
pub struct RequestLogger {
    timezone: Tz,
    sink: Arc<dyn RecordSink>,
}

impl RequestLogger {
    pub fn new(timezone: Tz, sink: Arc<dyn RecordSink>) -> Self {
        Self { timezone, sink }
    }

    /// Logger writing to `tracing`.
    pub fn tracing(timezone: Tz) -> Self {
        Self::new(timezone, Arc::new(TracingSink))
    }
}

pub async fn log_requests(
    State(logger): State<Arc<RequestLogger>>,
    request: Request,
    next: Next,
) -> Response {
    let started_at = Utc::now();
    let start = Instant::now();

    // The context is fixed by the time it reaches this layer, so reading it
    // before dispatch sees the same value the handlers see.
    let method = request.method().to_string();
    let path = request.uri().path().to_owned();
    let os = RequestContext::of(&request)
        .map(|ctx| ctx.os().to_string())
        .unwrap_or_else(|| UNKNOWN_OS.to_string());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let record = LogRecord {
        timestamp: started_at.with_timezone(&logger.timezone).fixed_offset(),
        latency_us: u64::try_from(latency.as_micros()).unwrap_or(u64::MAX),
        method,
        path,
        status: response.status().as_u16(),
        os,
    };

    metrics::record_request(&record.path, record.status, latency);
    logger.sink.emit(&record);

    response
}
