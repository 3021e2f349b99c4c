use std::time::Duration;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::router::AppState;

#[derive(Debug, Serialize)]
pub struct HealthzResponse {
    pub message: &'static str,
}

/// Answers after the configured delay. A deliberately slow handler, useful
/// for observing shutdown draining.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthzResponse> {
    tokio::time::sleep(Duration::from_millis(state.health_delay_ms)).await;
    Json(HealthzResponse { message: "OK" })
}
