//! Serving and draining.
//!
//! # Task layout
//! ```text
//! caller task                     accept task                    connection tasks
//! ───────────                     ───────────                    ────────────────
//! advance(Serving)
//! spawn ───────────────────────▶  loop { accept → spawn } ─────▶ serve one connection
//!                                  (transient accept error: back off, retry)
//! await signal                       │
//! advance(ShuttingDown)              │
//! shutdown.trigger() ───────────▶  break, drop listener
//!                                  graceful drain (bounded) ────▶ finish in-flight, close
//!                                  deadline: abort the rest ────▶ dropped
//! join accept task ◀──────────────  return outcome
//! advance(Stopped)
//! ```

use std::future::Future;
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    server::graceful::GracefulShutdown,
    service::TowerToHyperService,
};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::lifecycle::shutdown::{Shutdown, ShutdownListener};
use crate::lifecycle::state::{LifecycleState, StateHandle, TransitionError};
use crate::net::{Accepted, Acceptor, ConnectionGuard, ConnectionTracker, ListenerError};
use crate::observability::metrics;

/// Reasons the server did not stop cleanly. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("listener failed: {0}")]
    Listener(#[from] ListenerError),

    #[error("shutdown deadline of {timeout:?} exceeded; {outstanding} connection(s) were forcibly closed")]
    DrainTimeout { timeout: Duration, outstanding: u64 },

    #[error("accept task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Owns the listening socket from `Serving` until `Stopped`.
pub struct LifecycleManager {
    state: StateHandle,
    tracker: ConnectionTracker,
    shutdown_timeout: Duration,
}

impl LifecycleManager {
    /// `shutdown_timeout` is a hard deadline: requests still running when it
    /// elapses have their connections closed.
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            state: StateHandle::new(),
            tracker: ConnectionTracker::new(),
            shutdown_timeout,
        }
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Serve `app` on `listener` until `signal` resolves, then drain.
    ///
    /// Returns once the accept task has fully exited. Transient accept errors
    /// are retried with backoff; a fatal one ends serving immediately and is
    /// returned without waiting for `signal`.
    pub async fn run<L, F>(&self, listener: L, app: Router, signal: F) -> Result<(), LifecycleError>
    where
        L: Acceptor,
        F: Future<Output = ()>,
    {
        let address = listener.local_addr().ok();
        self.state.advance(LifecycleState::Serving)?;
        tracing::info!(address = ?address, "Serving requests");

        let shutdown = Shutdown::new();
        let mut accept_task = tokio::spawn(accept_loop(
            listener,
            app,
            shutdown.listener(),
            self.tracker.clone(),
            self.shutdown_timeout,
        ));

        tokio::select! {
            _ = signal => {}
            joined = &mut accept_task => {
                // Only a fatal listener error ends the accept loop before shutdown.
                self.state.advance(LifecycleState::Stopped)?;
                return joined?;
            }
        }

        self.state.advance(LifecycleState::ShuttingDown)?;
        tracing::info!(
            in_flight = self.tracker.open_count(),
            timeout_secs = self.shutdown_timeout.as_secs_f64(),
            "Server is shutting down"
        );
        shutdown.trigger();

        let outcome = accept_task.await?;
        self.state.advance(LifecycleState::Stopped)?;
        outcome
    }
}

/// Delay after the first transient accept error. Doubles per consecutive
/// failure up to [`MAX_ACCEPT_BACKOFF`].
const MIN_ACCEPT_BACKOFF: Duration = Duration::from_millis(5);
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

async fn accept_loop<L: Acceptor>(
    listener: L,
    app: Router,
    mut shutdown: ShutdownListener,
    tracker: ConnectionTracker,
    drain_timeout: Duration,
) -> Result<(), LifecycleError> {
    let graceful = GracefulShutdown::new();
    let mut connections = JoinSet::new();
    let mut builder = http1::Builder::new();
    builder.timer(TokioTimer::new());

    let mut backoff = Duration::ZERO;
    let mut resume_at: Option<Instant> = None;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.wait() => break,

            // Reap finished connection tasks as we go.
            Some(_) = connections.join_next(), if !connections.is_empty() => {}

            _ = tokio::time::sleep_until(resume_at.unwrap_or_else(Instant::now)), if resume_at.is_some() => {
                resume_at = None;
            }

            accepted = listener.accept(), if resume_at.is_none() => match accepted {
                Ok(Accepted { stream, peer, slot }) => {
                    backoff = Duration::ZERO;

                    let guard = tracker.open(peer);
                    let service = TowerToHyperService::new(app.clone());
                    let connection = graceful.watch(builder.serve_connection(TokioIo::new(stream), service));

                    connections.spawn(async move {
                        let _slot = slot;
                        if let Err(e) = connection.await {
                            log_connection_error(&guard, &e);
                        }
                        drop(guard);
                    });
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!(error = %e, open = tracker.open_count(), "Listener failed, closing connections");
                    connections.shutdown().await;
                    return Err(e.into());
                }
                Err(e) => {
                    backoff = (backoff * 2).clamp(MIN_ACCEPT_BACKOFF, MAX_ACCEPT_BACKOFF);
                    metrics::record_accept_error();
                    tracing::warn!(error = %e, retry_in_ms = backoff.as_millis() as u64, "Accept failed, retrying");
                    resume_at = Some(Instant::now() + backoff);
                }
            },
        }
    }

    drop(listener);
    tracing::info!(
        in_flight = tracker.open_count(),
        "Listener closed, draining connections"
    );

    match tokio::time::timeout(drain_timeout, graceful.shutdown()).await {
        Ok(()) => {
            while connections.join_next().await.is_some() {}
            tracing::info!("All connections drained");
            Ok(())
        }
        Err(_) => {
            let outstanding = tracker.open_count();
            connections.shutdown().await;
            tracing::error!(
                outstanding,
                timeout_secs = drain_timeout.as_secs_f64(),
                "Shutdown deadline exceeded, closing remaining connections"
            );
            Err(LifecycleError::DrainTimeout {
                timeout: drain_timeout,
                outstanding,
            })
        }
    }
}

fn log_connection_error(guard: &ConnectionGuard, e: &hyper::Error) {
    // Clients hanging up mid-request are routine.
    if e.is_incomplete_message() || e.is_canceled() {
        tracing::debug!(connection_id = %guard.id(), peer = %guard.peer(), error = %e, "Connection closed early");
    } else {
        tracing::warn!(connection_id = %guard.id(), peer = %guard.peer(), error = %e, "Connection error");
    }
}
