//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the store (creating and migrating it if needed)
//! - Build the router and wrap it in the middleware pipeline
//! - Bind the listener last, so traffic only arrives once everything is ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use axum::Router;
use chrono_tz::Tz;
use sqlx::SqlitePool;

use crate::config::ServerConfig;
use crate::http::middleware::{Credentials, RequestLogger};
use crate::http::{build_router, pipeline, AppState};
use crate::net::{Listener, ListenerError};
use crate::service::TodoService;
use crate::store::{self, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("unknown timezone '{0}'")]
    Timezone(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Everything the lifecycle manager needs to start serving.
pub struct Prepared {
    pub listener: Listener,
    pub app: Router,
    pub pool: SqlitePool,
}

pub async fn prepare(config: &ServerConfig) -> Result<Prepared, StartupError> {
    let timezone: Tz = config
        .observability
        .timezone
        .parse()
        .map_err(|_| StartupError::Timezone(config.observability.timezone.clone()))?;

    let pool = store::open(&config.store.path, config.store.max_connections).await?;
    let app = build_app(config, pool.clone(), Arc::new(RequestLogger::tracing(timezone)));
    let listener = Listener::bind(&config.listener).await?;

    Ok(Prepared {
        listener,
        app,
        pool,
    })
}

/// Assemble the full request pipeline around the route table.
pub fn build_app(config: &ServerConfig, pool: SqlitePool, logger: Arc<RequestLogger>) -> Router {
    let state = AppState {
        todos: TodoService::new(pool),
        health_delay_ms: config.health.delay_ms,
    };
    let credentials = Arc::new(Credentials::from_config(&config.auth));
    let router = build_router(state, credentials, config.security.max_body_size);

    tracing::debug!(stages = ?pipeline::STAGES, "Middleware pipeline composed");
    pipeline::compose(router, logger)
}
